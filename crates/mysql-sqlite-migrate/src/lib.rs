//! # mysql-sqlite-migrate
//!
//! One-shot, unidirectional MySQL/MariaDB to SQLite transfer engine.
//!
//! Reads a MySQL schema and its row data and materializes an equivalent
//! SQLite database in a single output file, with support for:
//!
//! - **Schema translation**: column types, defaults, indices, and foreign
//!   keys mapped into SQLite DDL that preserves semantics as faithfully as
//!   SQLite allows
//! - **Bounded-memory row streaming** with chunked commits and a
//!   reconnect-once recovery policy
//! - **Capability-aware output**: JSON1 and STRICT table support probed at
//!   startup
//! - **Idempotent re-runs** via `IF NOT EXISTS` DDL and `INSERT OR IGNORE`
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_sqlite_migrate::{Config, MysqlConfig, Orchestrator, SqliteConfig, TransferOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         mysql: MysqlConfig {
//!             database: "shop".into(),
//!             user: "reader".into(),
//!             ..Default::default()
//!         },
//!         sqlite: SqliteConfig { file: "shop.sqlite3".into() },
//!         options: TransferOptions::default(),
//!     };
//!     let result = Orchestrator::new(config)?.run().await?;
//!     println!("Transferred {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use config::{Collation, Config, MysqlConfig, SqliteConfig, TransferOptions};
pub use self::core::schema::{
    ColumnDescriptor, FkAction, ForeignKeyDescriptor, IndexColumn, IndexDescriptor, IndexKind,
    TableDescriptor, TableKind,
};
pub use self::core::value::{FieldKind, SqliteValue, ValueDecodeError};
pub use dialect::{DdlEmitter, IndexNamer, SourceType, SqliteType, TableDdl, TypeOptions};
pub use error::{Result, TransferError};
pub use orchestrator::{LogSink, Orchestrator, ProgressEvent, ProgressSink, TransferResult};
pub use source::MysqlSource;
pub use target::{SqliteCapabilities, SqliteTarget};
