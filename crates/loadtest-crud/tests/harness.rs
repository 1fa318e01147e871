//! End-to-end runs of the harness against in-memory tables and unreachable hosts.

use loadtest_crud::{
    ConnectionSettings, FailurePolicy, LoadTestError, MemoryStore, MySqlStore, Registry,
    RunConfig,
};
use std::time::Duration;

fn config(requests: usize, parallel: usize) -> RunConfig {
    RunConfig {
        requests,
        parallel,
        policy: FailurePolicy::Abort,
        create_table: false,
        truncate: false,
    }
}

fn hosts(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_single_host_run_counts_every_unit() {
    let registry = Registry::open(&hosts(&["localhost"]), |_| Ok(MemoryStore::new())).unwrap();

    let report = loadtest_crud::run(&registry, &config(50, 5)).await.unwrap();

    assert_eq!(report.requested, 50);
    assert_eq!(report.final_count, 50);
    assert_eq!(report.failed_units, 0);
    assert_eq!(report.count_host, "localhost");

    let mut out = Vec::new();
    report.print_summary(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with('s'), "duration line: {}", lines[0]);
    assert_eq!(lines[1], "insert num = 50, select count = 50");
}

#[tokio::test]
async fn test_rows_are_fresh_after_run() {
    let registry = Registry::open(&hosts(&["a"]), |_| Ok(MemoryStore::new())).unwrap();
    loadtest_crud::run(&registry, &config(20, 4)).await.unwrap();

    let store = registry.get("a").unwrap();
    let rows = loadtest_crud::ops::select_all(store.as_ref()).await.unwrap();
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|r| r.is_test && r.text == "test"));
}

#[tokio::test]
async fn test_count_is_read_from_first_host_only() {
    let registry = Registry::open(&hosts(&["a", "b"]), |_| Ok(MemoryStore::new())).unwrap();

    let report = loadtest_crud::run(&registry, &config(51, 5)).await.unwrap();

    assert_eq!(report.count_host, "a");
    assert_eq!(report.final_count, 26);
    let b = registry.get("b").unwrap();
    assert_eq!(loadtest_crud::ops::select_count(b.as_ref()).await.unwrap(), 25);
}

#[tokio::test]
async fn test_truncate_empties_tables_before_run() {
    let registry = Registry::open(&hosts(&["a"]), |_| Ok(MemoryStore::new())).unwrap();
    loadtest_crud::run(&registry, &config(10, 2)).await.unwrap();

    let mut again = config(5, 2);
    again.create_table = true;
    again.truncate = true;
    let report = loadtest_crud::run(&registry, &again).await.unwrap();

    assert_eq!(report.final_count, 5);
}

fn unreachable_settings(port: &str) -> ConnectionSettings {
    ConnectionSettings {
        user: "root".to_string(),
        password: None,
        port: port.to_string(),
        database: "test".to_string(),
        table: "test".to_string(),
        max_connections: 5,
    }
}

#[tokio::test]
async fn test_unreachable_host_aborts_run() {
    // Nothing listens on port 1, so the first statement fails to connect.
    let settings = unreachable_settings("1");
    let registry =
        Registry::open(&hosts(&["127.0.0.1"]), |h| MySqlStore::connect(h, &settings)).unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(60),
        loadtest_crud::run(&registry, &config(50, 5)),
    )
    .await
    .expect("run against an unreachable host should fail, not hang");

    assert!(matches!(result, Err(LoadTestError::MySQL(_))));
}

#[tokio::test]
async fn test_malformed_port_fails_at_startup() {
    let settings = unreachable_settings("not-a-port");
    let result = Registry::open(&hosts(&["localhost"]), |h| MySqlStore::connect(h, &settings));
    assert!(matches!(
        result,
        Err(LoadTestError::InvalidConnection { host, .. }) if host == "localhost"
    ));
}
