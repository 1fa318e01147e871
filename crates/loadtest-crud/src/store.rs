//! The test row model and the store seam the row operations run against.

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Default name of the table holding test rows.
pub const DEFAULT_TABLE: &str = "test";

/// Constant text written into every inserted row.
pub const TEST_TEXT: &str = "test";

/// One row of the test table.
///
/// `Default` is the all-zero row returned when a lookup by code finds nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRow {
    pub id: i64,
    pub code: String,
    pub text: String,
    pub is_test: bool,
    pub created_at: NaiveDateTime,
}

/// Result metadata of a single write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
}

/// Single-round-trip access to one host's test table.
///
/// Implementations must be safe to share across concurrently running work
/// units; each call is a standalone auto-committed statement.
#[async_trait]
pub trait RowStore: Send + Sync + 'static {
    /// Create the test table if it does not exist yet.
    async fn ensure_table(&self) -> Result<()>;

    /// Delete every row, returning how many were removed.
    async fn clear_table(&self) -> Result<u64>;

    async fn insert_row(
        &self,
        code: &str,
        text: &str,
        is_test: bool,
        created_at: NaiveDateTime,
    ) -> Result<WriteOutcome>;

    async fn update_flag(&self, code: &str, is_test: bool) -> Result<WriteOutcome>;

    async fn delete_row(&self, code: &str) -> Result<WriteOutcome>;

    /// First row matching `code`, if any.
    async fn select_one(&self, code: &str) -> Result<Option<TestRow>>;

    async fn select_all(&self) -> Result<Vec<TestRow>>;

    async fn select_count(&self) -> Result<u64>;
}
