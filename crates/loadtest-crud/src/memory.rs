//! In-process row store used for dry runs and tests.

use crate::error::Result;
use crate::store::{RowStore, TestRow, WriteOutcome};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, TestRow>,
}

/// A test table kept in memory, with auto-increment ids starting at 1.
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn ensure_table(&self) -> Result<()> {
        Ok(())
    }

    async fn clear_table(&self) -> Result<u64> {
        let mut table = self.table.lock().await;
        let removed = table.rows.len() as u64;
        table.rows.clear();
        Ok(removed)
    }

    async fn insert_row(
        &self,
        code: &str,
        text: &str,
        is_test: bool,
        created_at: NaiveDateTime,
    ) -> Result<WriteOutcome> {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(
            id,
            TestRow {
                id,
                code: code.to_string(),
                text: text.to_string(),
                is_test,
                created_at,
            },
        );
        Ok(WriteOutcome {
            affected_rows: 1,
            last_insert_id: Some(id as u64),
        })
    }

    async fn update_flag(&self, code: &str, is_test: bool) -> Result<WriteOutcome> {
        let mut table = self.table.lock().await;
        let mut affected_rows = 0;
        for row in table.rows.values_mut().filter(|r| r.code == code) {
            // MySQL reports only rows whose value actually changed
            if row.is_test != is_test {
                row.is_test = is_test;
                affected_rows += 1;
            }
        }
        Ok(WriteOutcome {
            affected_rows,
            last_insert_id: None,
        })
    }

    async fn delete_row(&self, code: &str) -> Result<WriteOutcome> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|_, r| r.code != code);
        Ok(WriteOutcome {
            affected_rows: (before - table.rows.len()) as u64,
            last_insert_id: None,
        })
    }

    async fn select_one(&self, code: &str) -> Result<Option<TestRow>> {
        let table = self.table.lock().await;
        Ok(table.rows.values().find(|r| r.code == code).cloned())
    }

    async fn select_all(&self) -> Result<Vec<TestRow>> {
        let table = self.table.lock().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn select_count(&self) -> Result<u64> {
        let table = self.table.lock().await;
        Ok(table.rows.len() as u64)
    }
}
