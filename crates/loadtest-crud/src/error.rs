//! Error types for the CRUD load harness.

use thiserror::Error;

/// Errors that can occur while preparing or running a load test.
#[derive(Error, Debug)]
pub enum LoadTestError {
    /// MySQL connection or query error.
    #[error("MySQL error: {0}")]
    MySQL(#[from] mysql_async::Error),

    /// Connection parameters for a host could not be turned into pool options.
    #[error("Invalid connection settings for host '{host}': {reason}")]
    InvalidConnection { host: String, reason: String },

    /// Lookup of a host that was never provisioned in the registry.
    #[error("Host '{0}' is not registered")]
    UnknownHost(String),

    /// The operating system random source failed.
    #[error("Random source error: {0}")]
    Random(String),

    /// A column value could not be converted into a test row field.
    #[error("Unexpected value in column '{column}': {detail}")]
    Column { column: &'static str, detail: String },

    /// A re-read after the update still observed `is_test = true`.
    #[error("Row '{code}' still has is_test = true after update")]
    UpdateNotVisible { code: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A spawned work unit panicked or was cancelled.
    #[error("Work unit did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LoadTestError>;
