//! Destination side: the SQLite connection, the foreign-key suspension
//! guard, and the batched row writer.
//!
//! The destination is an exclusive single writer. Foreign-key enforcement is
//! taken down for the duration of the transfer (forward-referencing and
//! cyclic FK declarations then load in any order) and restored on every exit
//! path by an RAII guard.

pub mod capability;

use std::path::Path;

use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::debug;

use crate::core::identifier::quote_sqlite;
use crate::core::value::SqliteValue;
use crate::error::Result;

pub use capability::{probe, SqliteCapabilities};

/// Busy handler timeout for the destination file.
const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// The destination SQLite database.
pub struct SqliteTarget {
    conn: Connection,
    capabilities: SqliteCapabilities,
}

impl SqliteTarget {
    /// Open (or create) the destination file and probe its capabilities.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory destination, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let capabilities = capability::probe(&conn)?;
        debug!(
            version = %capabilities.version,
            json1 = capabilities.json1_available,
            strict = capabilities.strict_tables_available,
            "probed destination SQLite build"
        );
        Ok(Self { conn, capabilities })
    }

    /// The probed capabilities.
    pub fn capabilities(&self) -> &SqliteCapabilities {
        &self.capabilities
    }

    /// Disable foreign-key enforcement until the returned guard drops.
    pub fn suspend_foreign_keys(&self) -> Result<ForeignKeyGuard<'_>> {
        self.conn.execute_batch("PRAGMA foreign_keys=OFF")?;
        Ok(ForeignKeyGuard { conn: &self.conn })
    }

    /// Execute a DDL script (one `CREATE TABLE` plus its indices).
    pub fn execute_ddl(&self, script: &str) -> Result<()> {
        self.conn.execute_batch(script)?;
        Ok(())
    }

    /// Build the `INSERT OR IGNORE` statement for one table.
    ///
    /// `OR IGNORE` makes re-runs and resumed transfers survivable: rows that
    /// already landed are skipped instead of failing the batch.
    pub fn build_insert_sql(&self, table: &str, columns: &[String]) -> Result<String> {
        let fields = columns
            .iter()
            .map(|c| quote_sqlite(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
            quote_sqlite(table)?,
            fields,
            placeholders
        ))
    }

    /// Begin a write transaction for one table (or one chunk of it).
    pub fn begin_write(&self, insert_sql: &str) -> Result<TableWriter<'_>> {
        let tx = self.conn.unchecked_transaction()?;
        Ok(TableWriter {
            tx,
            insert_sql: insert_sql.to_string(),
            rows_written: 0,
        })
    }

    /// Rebuild the database file, repacking free pages.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }

    /// Direct access for tests and identity checks.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Scope-exit action: re-enables foreign-key enforcement when dropped,
/// on success, error, and unwind paths alike.
pub struct ForeignKeyGuard<'conn> {
    conn: &'conn Connection,
}

impl Drop for ForeignKeyGuard<'_> {
    fn drop(&mut self) {
        // nothing useful to do with a failure during unwind
        let _ = self.conn.execute_batch("PRAGMA foreign_keys=ON");
    }
}

/// Batched row writer for one transaction.
pub struct TableWriter<'conn> {
    tx: Transaction<'conn>,
    insert_sql: String,
    rows_written: u64,
}

impl TableWriter<'_> {
    /// Bind and execute the insert for each row.
    pub fn write_rows(&mut self, rows: &[Vec<SqliteValue>]) -> Result<u64> {
        let mut stmt = self.tx.prepare_cached(&self.insert_sql)?;
        for row in rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
        self.rows_written += rows.len() as u64;
        Ok(self.rows_written)
    }

    /// Rows written so far in this transaction.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Commit the transaction.
    pub fn commit(self) -> Result<u64> {
        let rows = self.rows_written;
        self.tx.commit()?;
        Ok(rows)
    }
}
