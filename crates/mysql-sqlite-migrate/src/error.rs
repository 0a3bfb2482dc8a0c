//! Error types for the transfer engine.

use thiserror::Error;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Configuration error (invalid flag combination, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// MySQL connection or query error
    #[error("MySQL error: {0}")]
    Source(#[from] sqlx::Error),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Destination(#[from] rusqlite::Error),

    /// Connection to the MySQL server was lost and the single permitted
    /// reconnection attempt for the table also failed.
    #[error("Connection to MySQL server lost while transferring table {table}: {message}")]
    ConnectionLost { table: String, message: String },

    /// A column type or default could not be translated to SQLite
    #[error("Schema translation failed for {table}.{column}: {message}")]
    Schema {
        table: String,
        column: String,
        message: String,
    },

    /// A row value could not be converted to a SQLite storage class
    #[error("Data conversion failed for {table}.{column} at row {row}: {message}")]
    Data {
        table: String,
        column: String,
        row: u64,
        message: String,
    },

    /// IO error (log file, output file path)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (run summary output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transfer was interrupted (SIGINT, etc.)
    #[error("Transfer interrupted")]
    Interrupted,
}

impl TransferError {
    /// Create a Schema error.
    pub fn schema(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TransferError::Schema {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a Data error.
    pub fn data(
        table: impl Into<String>,
        column: impl Into<String>,
        row: u64,
        message: impl Into<String>,
    ) -> Self {
        TransferError::Data {
            table: table.into(),
            column: column.into(),
            row,
            message: message.into(),
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            TransferError::Config(_) => 1,
            TransferError::Source(_) => 2,
            TransferError::ConnectionLost { .. } => 2,
            TransferError::Schema { .. } | TransferError::Data { .. } => 3,
            TransferError::Destination(_) => 4,
            TransferError::Io(_) | TransferError::Json(_) => 4,
            TransferError::Interrupted => 5,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

/// Classify a MySQL driver error as a transient connection loss.
///
/// Covers the "server has gone away" (2006) and "lost connection during
/// query" (2013) classes as well as raw socket failures. Anything else is a
/// hard error and must not be retried.
pub fn is_connection_lost(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) => true,
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            let msg = db.message().to_lowercase();
            msg.contains("server has gone away") || msg.contains("lost connection")
        }
        sqlx::Error::Protocol(msg) => {
            let msg = msg.to_lowercase();
            msg.contains("connection") || msg.contains("eof")
        }
        _ => false,
    }
}
