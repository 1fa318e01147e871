//! Command-line interface for crud-loadtest
//!
//! # Usage Examples
//!
//! ```bash
//! # 1000 insert/update/delete/insert cycles against a local TiDB, 20 at a time
//! crud-loadtest -h localhost -P 4000 -d test
//!
//! # Spread 50000 cycles over two MySQL hosts, creating and emptying the table first
//! crud-loadtest -h db1,db2 -P 3306 -U bench -n 50000 -t 64 \
//!   --create-table --truncate
//!
//! # Exercise the scheduler without a database and keep the report as JSON
//! crud-loadtest --dry-run -n 100 -t 5 --emit-metrics report.json
//! ```
//!
//! Output is the elapsed wall-clock time followed by
//! `insert num = <requests>, select count = <rows on the first host>`.

use anyhow::Context;
use clap::{ArgAction, Parser};
use loadtest_crud::{CrudLoadtestArgs, MemoryStore, MySqlStore, Registry, Report};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crud-loadtest")]
#[command(about = "Concurrent CRUD load generator for MySQL-protocol databases")]
#[command(long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    #[command(flatten)]
    args: CrudLoadtestArgs,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let args = cli.args;

    // RUST_LOG wins over --debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(args.debug))),
        )
        .init();

    let config = args.run_config();

    let report = if args.dry_run {
        tracing::info!("Dry run: using in-memory tables");
        let registry = Registry::open(&args.hosts, |_| Ok(MemoryStore::new()))?;
        loadtest_crud::run(&registry, &config).await?
    } else {
        let settings = args.connection_settings();
        let registry = Registry::open(&args.hosts, |host| MySqlStore::connect(host, &settings))
            .context("Failed to set up connection pools")?;
        let report = loadtest_crud::run(&registry, &config)
            .await
            .context("Load test aborted")?;
        disconnect_all(registry).await;
        report
    };

    emit(&report, &args)
}

/// Log filter used when `RUST_LOG` is unset.
///
/// Outside debug mode only warnings and errors are logged, so stdout carries
/// nothing but the report.
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "info,crud_loadtest=debug,loadtest_crud=debug"
    } else {
        "warn"
    }
}

async fn disconnect_all(registry: Registry<MySqlStore>) {
    for store in registry.into_stores() {
        // Only the last handle can close the pool; others are left to drop.
        if let Ok(store) = std::sync::Arc::try_unwrap(store) {
            if let Err(e) = store.disconnect().await {
                tracing::warn!("Failed to close connection pool: {e}");
            }
        }
    }
}

fn emit(report: &Report, args: &CrudLoadtestArgs) -> anyhow::Result<()> {
    report.print_summary(&mut std::io::stdout().lock())?;

    if let Some(path) = &args.emit_metrics {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write metrics to {path:?}"))?;
        tracing::info!("Metrics written to {:?}", path);
    }
    Ok(())
}
