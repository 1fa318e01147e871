//! CLI argument definitions for the CRUD load harness.

use crate::harness::RunConfig;
use crate::mysql::ConnectionSettings;
use crate::scheduler::FailurePolicy;
use crate::store::DEFAULT_TABLE;
use clap::Args;
use std::path::PathBuf;

/// Connection and workload arguments.
///
/// `-h` selects hosts, so the surrounding command must serve help on
/// `--help` only.
#[derive(Args, Clone, Debug)]
pub struct CrudLoadtestArgs {
    /// Database user
    #[arg(short = 'U', long, default_value = "root", env = "LOADTEST_DB_USER")]
    pub user: String,

    /// Database password (connections are passwordless when omitted)
    #[arg(long, env = "LOADTEST_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database hosts (comma-separated); work is spread over them round-robin
    #[arg(short = 'h', long, value_delimiter = ',', default_value = "localhost")]
    pub hosts: Vec<String>,

    /// Database port
    #[arg(short = 'P', long, default_value = "4000")]
    pub port: String,

    /// Database name
    #[arg(short = 'd', long, default_value = "test")]
    pub database: String,

    /// Table holding the test rows
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Total number of work units to run
    #[arg(short = 'n', long, default_value = "1000")]
    pub requests: usize,

    /// Maximum number of work units in flight
    #[arg(
        short = 't',
        long,
        default_value = "20",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub parallel: u32,

    /// Log generated codes and per-statement row counts
    #[arg(long)]
    pub debug: bool,

    /// Create the test table on every host before the run
    #[arg(long)]
    pub create_table: bool,

    /// Delete all rows from the test table on every host before the run
    #[arg(long)]
    pub truncate: bool,

    /// Count failed work units and continue instead of stopping the run
    #[arg(long)]
    pub keep_going: bool,

    /// Run against an in-memory table instead of a database
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the run report as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub emit_metrics: Option<PathBuf>,
}

impl CrudLoadtestArgs {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            user: self.user.clone(),
            password: self.password.clone(),
            port: self.port.clone(),
            database: self.database.clone(),
            table: self.table.clone(),
            max_connections: self.parallel as usize,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            requests: self.requests,
            parallel: self.parallel as usize,
            policy: if self.keep_going {
                FailurePolicy::Isolate
            } else {
                FailurePolicy::Abort
            },
            create_table: self.create_table,
            truncate: self.truncate,
        }
    }
}
