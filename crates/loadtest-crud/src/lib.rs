//! Concurrent CRUD load harness for MySQL-protocol databases.
//!
//! Each work unit inserts a row under a freshly generated code, clears its
//! `is_test` flag (checking the change is visible on re-read), deletes it and
//! inserts it again under the same code. Units are spread round-robin over the
//! configured hosts and at most `parallel` run at once. The run reports its
//! wall-clock duration and the row count of the first host.

pub mod args;
pub mod code;
pub mod error;
pub mod harness;
pub mod memory;
pub mod mysql;
pub mod ops;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod work_unit;

pub use args::CrudLoadtestArgs;
pub use error::{LoadTestError, Result};
pub use harness::{run, RunConfig};
pub use memory::MemoryStore;
pub use mysql::{ConnectionSettings, MySqlStore};
pub use registry::Registry;
pub use report::Report;
pub use scheduler::{FailurePolicy, Scheduler};
pub use store::{RowStore, TestRow};
