//! Bounded-concurrency launcher for work units.
//!
//! Units are launched in index order while an admission gate of `parallel`
//! slots has room; the launcher waits for a slot when the gate is full. After
//! the last launch the scheduler drains, joining every unit before returning.
//!
//! Failure handling is decided here and nowhere else. Under
//! [`FailurePolicy::Abort`] the first failed unit ends the run and the units
//! still in flight are cancelled. Under [`FailurePolicy::Isolate`] failures
//! are logged and counted and the run continues.

use crate::error::{LoadTestError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// What to do when a work unit returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run on the first failure.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Isolate,
}

/// Counts gathered while running units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleOutcome {
    pub launched: usize,
    pub failed: usize,
}

/// Host for the unit launched at `index`.
///
/// Panics if `hosts` is empty.
pub fn assign_host(index: usize, hosts: &[String]) -> &str {
    &hosts[index % hosts.len()]
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    total: usize,
    parallel: usize,
    policy: FailurePolicy,
}

impl Scheduler {
    pub fn new(total: usize, parallel: usize, policy: FailurePolicy) -> Result<Self> {
        if parallel == 0 {
            return Err(LoadTestError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            total,
            parallel,
            policy,
        })
    }

    /// Launch `total` units, the i-th bound to `hosts[i % hosts.len()]`, and
    /// wait for all of them.
    pub async fn run<F, Fut>(&self, hosts: &[String], unit: F) -> Result<ScheduleOutcome>
    where
        F: Fn(usize, &str) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if hosts.is_empty() {
            return Err(LoadTestError::Config(
                "at least one host is required".to_string(),
            ));
        }

        let gate = Arc::new(Semaphore::new(self.parallel));
        // Dropping the set on an early return aborts every unit still in flight.
        let mut units = JoinSet::new();
        let mut outcome = ScheduleOutcome::default();

        for index in 0..self.total {
            let permit = gate
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| LoadTestError::Config(format!("admission gate closed: {e}")))?;
            let work = unit(index, assign_host(index, hosts));
            units.spawn(async move {
                let result = work.await;
                drop(permit);
                result
            });
            outcome.launched += 1;

            while let Some(done) = units.try_join_next() {
                self.settle(done, &mut outcome)?;
            }
        }

        debug!(launched = outcome.launched, "All units launched, draining");
        while let Some(done) = units.join_next().await {
            self.settle(done, &mut outcome)?;
        }

        Ok(outcome)
    }

    fn settle(
        &self,
        done: std::result::Result<Result<()>, JoinError>,
        outcome: &mut ScheduleOutcome,
    ) -> Result<()> {
        let err = match done {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(e) => LoadTestError::Join(e),
        };
        match self.policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Isolate => {
                warn!("Work unit failed: {err}");
                outcome.failed += 1;
                Ok(())
            }
        }
    }
}
