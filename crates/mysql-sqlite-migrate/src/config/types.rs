//! Configuration type definitions.
//!
//! The CLI is the configuration surface: flags are parsed by the frontend
//! and assembled into these structs. The engine only ever sees resolved
//! values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Source database (MySQL/MariaDB) connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MysqlConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password, if any.
    pub password: Option<String>,

    /// Session character set (default: utf8mb4).
    pub charset: String,

    /// Session collation; the server default for the charset when unset.
    pub collation: Option<String>,

    /// Disable TLS to the source.
    pub ssl_disabled: bool,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            database: String::new(),
            user: String::new(),
            password: None,
            charset: "utf8mb4".to_string(),
            collation: None,
            ssl_disabled: false,
        }
    }
}

impl fmt::Debug for MysqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("ssl_disabled", &self.ssl_disabled)
            .finish()
    }
}

/// Destination (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Output database file path. Created if missing; appended-to
    /// idempotently if present.
    pub file: PathBuf,
}

/// SQLite collating sequence applied to TEXT-affine columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Collation {
    #[default]
    Binary,
    Nocase,
    Rtrim,
}

impl Collation {
    /// Keyword as it appears in a `COLLATE` clause.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Collation::Binary => "BINARY",
            Collation::Nocase => "NOCASE",
            Collation::Rtrim => "RTRIM",
        }
    }
}

impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Collation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BINARY" => Ok(Collation::Binary),
            "NOCASE" => Ok(Collation::Nocase),
            "RTRIM" => Ok(Collation::Rtrim),
            other => Err(format!(
                "unknown collation {:?}; expected BINARY, NOCASE, or RTRIM",
                other
            )),
        }
    }
}

/// Behavior flags for one transfer run, resolved from the CLI surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Include-list of tables. Implies foreign-key suppression.
    pub tables: Vec<String>,

    /// Exclude-list of tables. Implies foreign-key suppression.
    /// Mutually exclusive with `tables`.
    pub exclude_tables: Vec<String>,

    /// Per-table row cap.
    pub limit_rows: Option<u64>,

    /// Collation for TEXT-affine columns.
    pub collation: Collation,

    /// Prefix all index names with `<table>_`.
    pub prefix_indices: bool,

    /// Suppress foreign keys.
    pub without_foreign_keys: bool,

    /// Suppress DDL; stream data into an existing schema.
    pub without_tables: bool,

    /// Suppress data; DDL only.
    pub without_data: bool,

    /// Materialize views as regular tables. Views are skipped otherwise.
    pub views_as_tables: bool,

    /// Emit STRICT tables when the destination build supports them.
    pub strict: bool,

    /// Force JSON columns to TEXT.
    pub json_as_text: bool,

    /// Rows per chunk; unchunked streaming when unset.
    pub chunk_size: Option<usize>,

    /// Buffer whole resultsets client-side instead of streaming.
    pub buffered: bool,

    /// Run VACUUM after all tables complete.
    pub vacuum: bool,

    /// Errors only.
    pub quiet: bool,
}

impl TransferOptions {
    /// Whether the plan covers only a subset of the database's tables.
    /// Any subset suppresses all foreign-key emission.
    pub fn is_subset(&self) -> bool {
        !self.tables.is_empty() || !self.exclude_tables.is_empty()
    }

    /// Whether foreign keys will be emitted.
    pub fn emit_foreign_keys(&self) -> bool {
        !self.without_foreign_keys && !self.is_subset()
    }
}

/// Root configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source connection.
    pub mysql: MysqlConfig,

    /// Destination file.
    pub sqlite: SqliteConfig,

    /// Behavior flags.
    pub options: TransferOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collation_round_trip() {
        for (text, collation) in [
            ("BINARY", Collation::Binary),
            ("nocase", Collation::Nocase),
            ("Rtrim", Collation::Rtrim),
        ] {
            assert_eq!(text.parse::<Collation>().unwrap(), collation);
        }
        assert!("UTF16".parse::<Collation>().is_err());
    }

    #[test]
    fn test_subset_suppresses_foreign_keys() {
        let mut options = TransferOptions::default();
        assert!(options.emit_foreign_keys());

        options.tables = vec!["users".to_string()];
        assert!(options.is_subset());
        assert!(!options.emit_foreign_keys());

        options.tables.clear();
        options.exclude_tables = vec!["logs".to_string()];
        assert!(!options.emit_foreign_keys());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = MysqlConfig {
            password: Some("super_secret_123".to_string()),
            ..Default::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_123"));
    }
}
