//! Wiring of registry, scheduler and reporter into one run.

use crate::error::Result;
use crate::ops;
use crate::registry::Registry;
use crate::report::Report;
use crate::scheduler::{FailurePolicy, Scheduler};
use crate::store::RowStore;
use crate::work_unit::run_work_unit;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// Workload settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub requests: usize,
    pub parallel: usize,
    pub policy: FailurePolicy,
    pub create_table: bool,
    pub truncate: bool,
}

/// Create and/or empty the test table on every host, as configured.
pub async fn prepare_tables<S: RowStore>(
    registry: &Registry<S>,
    config: &RunConfig,
) -> Result<()> {
    for (host, store) in registry.stores() {
        if config.create_table {
            store.ensure_table().await?;
            info!("Ensured test table exists on {host}");
        }
        if config.truncate {
            let removed = store.clear_table().await?;
            info!("Removed {removed} rows from {host}");
        }
    }
    Ok(())
}

/// Run every work unit and report the elapsed time and final row count.
pub async fn run<S: RowStore>(registry: &Registry<S>, config: &RunConfig) -> Result<Report> {
    prepare_tables(registry, config).await?;

    info!(
        "Running {} work units over {} host(s) with parallelism {}",
        config.requests,
        registry.hosts().len(),
        config.parallel
    );

    let scheduler = Scheduler::new(config.requests, config.parallel, config.policy)?;
    let started_at = Utc::now();
    let begin = Instant::now();

    let outcome = scheduler
        .run(registry.hosts(), |index, host| {
            debug!(index, host, "Launching work unit");
            let store = registry.get(host);
            async move {
                let store = store?;
                run_work_unit(store.as_ref()).await
            }
        })
        .await?;

    let elapsed = begin.elapsed();
    let count_host = registry.first_host();
    let final_count = ops::select_count(registry.get(count_host)?.as_ref()).await?;

    info!(
        "Completed {} work units ({} failed) in {:?}",
        outcome.launched, outcome.failed, elapsed
    );

    Ok(Report::new(
        config.requests,
        outcome.failed,
        started_at,
        elapsed,
        count_host.to_string(),
        final_count,
    ))
}
