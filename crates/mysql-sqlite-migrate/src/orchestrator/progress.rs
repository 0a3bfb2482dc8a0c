//! Structured progress events and the sink they flow through.
//!
//! The engine reports table lifecycle and warnings as data; rendering is the
//! frontend's business. The default sink writes through `tracing`.

use tracing::{info, warn};

/// One structured progress event.
#[derive(Debug, Clone)]
pub enum ProgressEvent<'a> {
    /// The run began; the plan covers this many tables.
    RunStarted { tables: usize },

    /// A table moved out of Pending.
    TableStarted { table: &'a str, total_rows: u64 },

    /// A chunk committed to the destination.
    ChunkCommitted {
        table: &'a str,
        rows_done: u64,
        total_rows: u64,
    },

    /// A table finished, DDL and data both.
    TableDone { table: &'a str, rows: u64 },

    /// A non-fatal condition: dropped index, dropped default, renamed
    /// index, suppressed foreign keys.
    Warning { message: &'a str },

    /// The run finished successfully.
    RunFinished { tables: usize, rows: u64 },
}

/// Where progress events go. Implementations must not fail; reporting is
/// fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent<'_>);
}

/// Default sink: events become log records. `quiet` silences everything
/// below error severity, which this sink never emits.
#[derive(Debug, Default)]
pub struct LogSink {
    quiet: bool,
}

impl LogSink {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent<'_>) {
        if self.quiet {
            return;
        }
        match event {
            ProgressEvent::RunStarted { tables } => {
                info!("Transferring {} table(s)", tables);
            }
            ProgressEvent::TableStarted { table, total_rows } => {
                info!("Transferring table {} ({} rows)", table, total_rows);
            }
            ProgressEvent::ChunkCommitted {
                table,
                rows_done,
                total_rows,
            } => {
                info!("{}: {}/{} rows", table, rows_done, total_rows);
            }
            ProgressEvent::TableDone { table, rows } => {
                info!("Finished table {} ({} rows)", table, rows);
            }
            ProgressEvent::Warning { message } => {
                warn!("{}", message);
            }
            ProgressEvent::RunFinished { tables, rows } => {
                info!("Done! {} table(s), {} rows", tables, rows);
            }
        }
    }
}
