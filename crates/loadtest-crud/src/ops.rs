//! Row operations issued by work units.
//!
//! Each call is one round trip against a single host's store, except
//! [`update`], which re-reads the row to check the write is visible.

use crate::code::generate_code;
use crate::error::{LoadTestError, Result};
use crate::store::{RowStore, TestRow, TEST_TEXT};
use chrono::Utc;
use tracing::debug;

/// Insert a test row and return the code it was stored under.
///
/// An empty `code` is replaced by a freshly generated one.
pub async fn insert<S: RowStore + ?Sized>(store: &S, code: &str) -> Result<String> {
    let code = if code.is_empty() {
        let generated = generate_code()?;
        debug!(code = %generated, "Generated code");
        generated
    } else {
        code.to_string()
    };

    let outcome = store
        .insert_row(&code, TEST_TEXT, true, Utc::now().naive_utc())
        .await?;
    debug!(
        rows = outcome.affected_rows,
        last_insert_id = ?outcome.last_insert_id,
        "insert"
    );
    Ok(code)
}

/// Clear `is_test` on the row with `code`, then verify a re-read sees it.
pub async fn update<S: RowStore + ?Sized>(store: &S, code: &str) -> Result<()> {
    let outcome = store.update_flag(code, false).await?;
    debug!(rows = outcome.affected_rows, "update");

    let row = select_one(store, code).await?;
    if row.is_test {
        return Err(LoadTestError::UpdateNotVisible {
            code: code.to_string(),
        });
    }
    Ok(())
}

pub async fn delete<S: RowStore + ?Sized>(store: &S, code: &str) -> Result<()> {
    let outcome = store.delete_row(code).await?;
    debug!(rows = outcome.affected_rows, "delete");
    Ok(())
}

/// Row with `code`, or the all-default row when there is none.
pub async fn select_one<S: RowStore + ?Sized>(store: &S, code: &str) -> Result<TestRow> {
    Ok(store.select_one(code).await?.unwrap_or_default())
}

pub async fn select_all<S: RowStore + ?Sized>(store: &S) -> Result<Vec<TestRow>> {
    store.select_all().await
}

pub async fn select_count<S: RowStore + ?Sized>(store: &S) -> Result<u64> {
    store.select_count().await
}
