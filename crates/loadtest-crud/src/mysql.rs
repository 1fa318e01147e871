//! Row store backed by a MySQL-protocol connection pool (MySQL, TiDB, ...).

use crate::error::{LoadTestError, Result};
use crate::store::{RowStore, TestRow, WriteOutcome};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::prelude::*;
use mysql_async::{OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, Value};
use tracing::debug;

/// Parameters shared by the pools of every host.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub user: String,
    pub password: Option<String>,
    pub port: String,
    pub database: String,
    pub table: String,
    /// Upper bound on pooled connections; idle connections never exceed it.
    pub max_connections: usize,
}

impl ConnectionSettings {
    /// Connection options for `host`, including credentials and pool limits.
    pub fn opts(&self, host: &str) -> Result<OptsBuilder> {
        if host.trim().is_empty() {
            return Err(LoadTestError::InvalidConnection {
                host: host.to_string(),
                reason: "host name is empty".to_string(),
            });
        }
        let port: u16 = self
            .port
            .parse()
            .map_err(|_| LoadTestError::InvalidConnection {
                host: host.to_string(),
                reason: format!("invalid port '{}'", self.port),
            })?;

        Ok(OptsBuilder::default()
            .ip_or_hostname(host)
            .tcp_port(port)
            .db_name(Some(self.database.clone()))
            .user(Some(self.user.clone()))
            .pass(self.password.clone())
            .pool_opts(self.pool_opts(host)?))
    }

    fn pool_opts(&self, host: &str) -> Result<PoolOpts> {
        let constraints = PoolConstraints::new(0, self.max_connections).ok_or_else(|| {
            LoadTestError::InvalidConnection {
                host: host.to_string(),
                reason: format!("invalid pool size {}", self.max_connections),
            }
        })?;
        Ok(PoolOpts::default().with_constraints(constraints))
    }
}

/// A pooled handle on one host's test table.
pub struct MySqlStore {
    pool: Pool,
    table: String,
}

impl MySqlStore {
    /// Build the pool for `host`. No connection is made until the first query.
    pub fn connect(host: &str, settings: &ConnectionSettings) -> Result<Self> {
        let opts = settings.opts(host)?;
        debug!(
            host,
            port = %settings.port,
            database = %settings.database,
            user = %settings.user,
            max_connections = settings.max_connections,
            "Opening connection pool"
        );

        Ok(Self {
            pool: Pool::new(opts),
            table: settings.table.clone(),
        })
    }

    /// Gracefully close every pooled connection.
    pub async fn disconnect(self) -> Result<()> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for MySqlStore {
    async fn ensure_table(&self) -> Result<()> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop(generate_create_table(&self.table)).await?;
        Ok(())
    }

    async fn clear_table(&self) -> Result<u64> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop(format!("DELETE FROM `{}`", self.table)).await?;
        Ok(conn.affected_rows())
    }

    async fn insert_row(
        &self,
        code: &str,
        text: &str,
        is_test: bool,
        created_at: NaiveDateTime,
    ) -> Result<WriteOutcome> {
        let sql = format!(
            "INSERT INTO `{}` (`code`, `text`, `is_test`, `created_at`) VALUES (?, ?, ?, ?)",
            self.table
        );
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(&sql, (code, text, is_test, datetime_to_value(&created_at)))
            .await?;
        Ok(WriteOutcome {
            affected_rows: conn.affected_rows(),
            last_insert_id: conn.last_insert_id(),
        })
    }

    async fn update_flag(&self, code: &str, is_test: bool) -> Result<WriteOutcome> {
        let sql = format!(
            "UPDATE `{}` SET `is_test` = ? WHERE `code` = ?",
            self.table
        );
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(&sql, (is_test, code)).await?;
        Ok(WriteOutcome {
            affected_rows: conn.affected_rows(),
            last_insert_id: None,
        })
    }

    async fn delete_row(&self, code: &str) -> Result<WriteOutcome> {
        let sql = format!("DELETE FROM `{}` WHERE `code` = ?", self.table);
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(&sql, (code,)).await?;
        Ok(WriteOutcome {
            affected_rows: conn.affected_rows(),
            last_insert_id: None,
        })
    }

    async fn select_one(&self, code: &str) -> Result<Option<TestRow>> {
        let sql = format!("{} WHERE `code` = ?", select_columns(&self.table));
        let mut conn = self.pool.get_conn().await?;
        let row: Option<Row> = conn.exec_first(&sql, (code,)).await?;
        row.map(row_to_test_row).transpose()
    }

    async fn select_all(&self) -> Result<Vec<TestRow>> {
        let sql = select_columns(&self.table);
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<Row> = conn.exec(&sql, ()).await?;
        rows.into_iter().map(row_to_test_row).collect()
    }

    async fn select_count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM `{}`", self.table);
        let mut conn = self.pool.get_conn().await?;
        let count: Option<i64> = conn.exec_first(&sql, ()).await?;
        Ok(count.unwrap_or(0) as u64)
    }
}

/// Generate the CREATE TABLE statement for the test table.
pub fn generate_create_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (\
         `id` BIGINT NOT NULL AUTO_INCREMENT, \
         `code` VARCHAR(255) NOT NULL, \
         `text` VARCHAR(255) NOT NULL, \
         `is_test` BOOLEAN NOT NULL, \
         `created_at` DATETIME(6) NOT NULL, \
         PRIMARY KEY (`id`), \
         KEY `idx_{table}_code` (`code`))"
    )
}

fn select_columns(table: &str) -> String {
    format!("SELECT `id`, `code`, `text`, `is_test`, `created_at` FROM `{table}`")
}

fn row_to_test_row(row: Row) -> Result<TestRow> {
    let (id, code, text, is_test, created_at) =
        mysql_async::from_row_opt::<(i64, String, String, bool, Value)>(row).map_err(|e| {
            LoadTestError::Column {
                column: "*",
                detail: e.to_string(),
            }
        })?;
    Ok(TestRow {
        id,
        code,
        text,
        is_test,
        created_at: value_to_datetime(&created_at)?,
    })
}

/// Convert a chrono timestamp into a MySQL DATETIME(6) parameter.
fn datetime_to_value(dt: &NaiveDateTime) -> Value {
    Value::Date(
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        dt.nanosecond() / 1000, // MySQL uses microseconds
    )
}

fn value_to_datetime(value: &Value) -> Result<NaiveDateTime> {
    let invalid = |detail: String| LoadTestError::Column {
        column: "created_at",
        detail,
    };
    match value {
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)
                .ok_or_else(|| invalid(format!("invalid date {year}-{month}-{day}")))?;
            let time =
                NaiveTime::from_hms_micro_opt(*hour as u32, *min as u32, *sec as u32, *micro)
                    .ok_or_else(|| invalid(format!("invalid time {hour}:{min}:{sec}")))?;
            Ok(NaiveDateTime::new(date, time))
        }
        Value::Bytes(b) => {
            let s = String::from_utf8_lossy(b);
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|e| invalid(format!("'{s}': {e}")))
        }
        other => Err(invalid(format!("unexpected value {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::Opts;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            user: "root".to_string(),
            password: None,
            port: "4000".to_string(),
            database: "test".to_string(),
            table: "test".to_string(),
            max_connections: 20,
        }
    }

    #[test]
    fn test_opts_carry_connection_settings() {
        let opts = Opts::from(settings().opts("db-1").unwrap());
        assert_eq!(opts.ip_or_hostname(), "db-1");
        assert_eq!(opts.tcp_port(), 4000);
        assert_eq!(opts.db_name(), Some("test"));
        assert_eq!(opts.user(), Some("root"));
        assert_eq!(opts.pass(), None);
    }

    #[test]
    fn test_opts_accept_ipv6_host_and_unusual_database_name() {
        let mut settings = settings();
        settings.database = "bench?v=1/#2".to_string();
        let opts = Opts::from(settings.opts("::1").unwrap());
        assert_eq!(opts.ip_or_hostname(), "::1");
        assert_eq!(opts.db_name(), Some("bench?v=1/#2"));
    }

    #[test]
    fn test_opts_reject_bad_port() {
        let mut settings = settings();
        settings.port = "40x0".to_string();
        let err = settings.opts("localhost").unwrap_err();
        assert!(matches!(err, LoadTestError::InvalidConnection { .. }));
    }

    #[test]
    fn test_opts_reject_empty_host() {
        let err = settings().opts("  ").unwrap_err();
        assert!(matches!(err, LoadTestError::InvalidConnection { .. }));
    }

    #[test]
    fn test_pool_caps_connections_at_parallelism() {
        let mut settings = settings();
        for limit in [1, 5, 20, 64] {
            settings.max_connections = limit;
            let constraints = settings.pool_opts("h").unwrap().constraints();
            assert_eq!(constraints.max(), limit);
            assert!(constraints.min() <= limit);

            let opts = Opts::from(settings.opts("h").unwrap());
            assert_eq!(opts.pool_opts().constraints().max(), limit);
        }
    }

    #[test]
    fn test_pool_opts_reject_zero_connections() {
        let mut settings = settings();
        settings.max_connections = 0;
        assert!(settings.pool_opts("localhost").is_err());
    }

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table("test");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `test`"));
        assert!(sql.contains("`id` BIGINT NOT NULL AUTO_INCREMENT"));
        assert!(sql.contains("`is_test` BOOLEAN NOT NULL"));
        assert!(sql.contains("`created_at` DATETIME(6) NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (`id`)"));
    }

    #[test]
    fn test_datetime_value_conversion() {
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 45, 7, 123_456)
            .unwrap();
        let value = datetime_to_value(&dt);
        assert_eq!(value, Value::Date(2024, 2, 29, 13, 45, 7, 123_456));
        assert_eq!(value_to_datetime(&value).unwrap(), dt);
    }

    #[test]
    fn test_datetime_from_text_protocol() {
        let value = Value::Bytes(b"2024-01-02 03:04:05.000006".to_vec());
        let dt = value_to_datetime(&value).unwrap();
        assert_eq!(dt.to_string(), "2024-01-02 03:04:05.000006");
        assert!(value_to_datetime(&Value::Int(1)).is_err());
    }
}
