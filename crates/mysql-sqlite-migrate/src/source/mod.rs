//! Source side: the MySQL/MariaDB connection.
//!
//! The engine holds exactly one source connection for its whole life, used
//! read-only. Introspection lives in [`introspect`], row streaming in
//! [`reader`].

pub mod introspect;
pub mod reader;

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use sqlx::Row;
use tracing::info;

use crate::config::MysqlConfig;
use crate::core::identifier::quote_mysql;
use crate::error::Result;

/// Connection acquire timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The source MySQL/MariaDB database.
pub struct MysqlSource {
    pool: MySqlPool,
    database: String,
}

impl MysqlSource {
    /// Connect to the source. The pool is capped at a single connection:
    /// the pipeline is serial and the source is read one statement at a
    /// time.
    pub async fn connect(config: &MysqlConfig) -> Result<Self> {
        let ssl_mode = if config.ssl_disabled {
            MySqlSslMode::Disabled
        } else {
            MySqlSslMode::Preferred
        };

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .charset(&config.charset)
            .ssl_mode(ssl_mode);
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(collation) = &config.collation {
            options = options.collation(collation);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await?;

        // fail here, not at first catalog read
        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        info!(
            "Connected to MySQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }

    /// The source database (schema) name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The underlying pool handle.
    pub(crate) fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Count the rows one table will contribute, honoring the per-table cap.
    pub async fn count_rows(&self, table: &str, limit: Option<u64>) -> Result<u64> {
        let table_ref = quote_mysql(table)?;
        let sql = match limit {
            Some(n) => format!(
                "SELECT COUNT(*) AS cnt FROM (SELECT 1 FROM {} LIMIT {}) AS capped",
                table_ref, n
            ),
            None => format!("SELECT COUNT(*) AS cnt FROM {}", table_ref),
        };
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>("cnt").max(0) as u64)
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
