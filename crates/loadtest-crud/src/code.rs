//! Natural-key generation for test rows.
//!
//! A code is the decimal Unix timestamp followed by the hex form of
//! [`RANDOM_BYTES`] bytes from the operating system RNG, and the whole string is
//! hex-encoded once more. The timestamp part collides freely within a second;
//! uniqueness comes from the random part. Collisions are not detected.

use crate::error::{LoadTestError, Result};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::TryRngCore;

/// Number of random bytes mixed into every code.
pub const RANDOM_BYTES: usize = 10;

/// Generate a fresh code for a test row.
pub fn generate_code() -> Result<String> {
    let mut buf = [0u8; RANDOM_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| LoadTestError::Random(e.to_string()))?;
    Ok(encode_code(Utc::now().timestamp(), &buf))
}

fn encode_code(unix_secs: i64, random: &[u8]) -> String {
    let raw = format!("{unix_secs}{}", hex::encode(random));
    hex::encode(raw)
}
