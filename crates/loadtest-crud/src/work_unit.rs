//! The insert, update, delete, re-insert cycle run once per request.

use crate::error::Result;
use crate::ops;
use crate::store::RowStore;

/// Run one work unit against `store`.
///
/// The trailing insert reuses the deleted row's code, so a completed unit
/// leaves exactly one fresh row with `is_test = true`.
pub async fn run_work_unit<S: RowStore + ?Sized>(store: &S) -> Result<()> {
    let code = ops::insert(store, "").await?;
    ops::update(store, &code).await?;
    ops::delete(store, &code).await?;
    ops::insert(store, &code).await?;
    Ok(())
}
