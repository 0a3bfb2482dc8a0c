//! Transfer orchestrator - drives the whole pipeline.
//!
//! Opens the destination and probes its capabilities, connects to the
//! source, introspects the schema, then handles one table at a time: create
//! its DDL, stream its rows, move on. The pipeline is strictly serial.
//! Foreign-key enforcement in the destination is suspended for the duration
//! of the run and restored by a scope-exit guard on every exit path, which
//! is also what lets cyclic and forward-referencing FK declarations load in
//! any order.

pub mod progress;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::core::schema::TableDescriptor;
use crate::core::value::FieldKind;
use crate::dialect::ddl::{DdlEmitter, IndexNamer};
use crate::dialect::typemap::{SourceType, TypeOptions};
use crate::error::{is_connection_lost, Result, TransferError};
use crate::source::MysqlSource;
use crate::target::SqliteTarget;

pub use progress::{LogSink, ProgressEvent, ProgressSink};

/// Flush size for batched inserts when no chunk size is configured.
const UNCHUNKED_FLUSH_ROWS: usize = 200;

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables covered by the plan.
    pub tables_total: usize,

    /// Tables fully transferred.
    pub tables_done: usize,

    /// Total rows written (pre-dedup; `INSERT OR IGNORE` may skip rows that
    /// already existed in the output file).
    pub rows_transferred: u64,
}

impl TransferResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Transfer orchestrator.
pub struct Orchestrator {
    config: Config,
    sink: Box<dyn ProgressSink>,
}

impl Orchestrator {
    /// Create an orchestrator; validates the configuration up front.
    pub fn new(config: Config) -> Result<Self> {
        config::validate(&config)?;
        let sink = Box::new(LogSink::new(config.options.quiet));
        Ok(Self { config, sink })
    }

    /// Replace the progress sink.
    pub fn with_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run the transfer.
    pub async fn run(&self) -> Result<TransferResult> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let options = &self.config.options;

        let target = SqliteTarget::open(&self.config.sqlite.file)?;
        let caps = target.capabilities().clone();

        let strict = if options.strict && !caps.strict_tables_available {
            self.warn(format!(
                "SQLite version {} does not support STRICT tables; tables will be created without strict mode",
                caps.version
            ));
            false
        } else {
            options.strict
        };

        let source = MysqlSource::connect(&self.config.mysql).await?;

        let listed = source.list_tables(options).await?;
        let mut tables = Vec::with_capacity(listed.len());
        for (name, kind) in &listed {
            tables.push(source.describe_table(name, *kind).await?);
        }

        let emit_fks = options.emit_foreign_keys();
        if options.is_subset() && !options.without_foreign_keys {
            self.warn(
                "foreign keys suppressed: the plan covers a subset of the database".to_string(),
            );
        }

        let type_opts = TypeOptions {
            json1_available: caps.json1_available,
            strict,
            json_as_text: options.json_as_text,
        };
        let namer = IndexNamer::new(
            tables.iter().map(|t| t.name.clone()),
            options.prefix_indices,
        );
        let mut emitter = DdlEmitter::new(type_opts, options.collation, emit_fks, namer);

        self.sink.emit(ProgressEvent::RunStarted {
            tables: tables.len(),
        });

        let mut rows_transferred: u64 = 0;
        let mut tables_done: usize = 0;

        {
            // forward-referencing and cyclic FKs load in any order while
            // enforcement is down; the guard restores it on every exit path
            let _fk_guard = target.suspend_foreign_keys()?;

            for table in &tables {
                rows_transferred += self.transfer_one(&source, &target, &mut emitter, table).await?;
                tables_done += 1;
            }
        }

        if options.vacuum {
            info!("Vacuuming the SQLite database file. This might take a while.");
            target.vacuum()?;
        }

        source.close().await;

        let completed_at = Utc::now();
        self.sink.emit(ProgressEvent::RunFinished {
            tables: tables_done,
            rows: rows_transferred,
        });

        Ok(TransferResult {
            started_at,
            completed_at,
            duration_seconds: clock.elapsed().as_secs_f64(),
            tables_total: tables.len(),
            tables_done,
            rows_transferred,
        })
    }

    /// Drive one table from pending through DDL creation and data
    /// streaming to done.
    async fn transfer_one(
        &self,
        source: &MysqlSource,
        target: &SqliteTarget,
        emitter: &mut DdlEmitter,
        table: &TableDescriptor,
    ) -> Result<u64> {
        let options = &self.config.options;

        if !options.without_tables {
            let ddl = emitter.emit_table(table)?;
            for warning in &ddl.warnings {
                self.sink.emit(ProgressEvent::Warning { message: warning });
            }
            target.execute_ddl(&ddl.script())?;
        }

        if options.without_data {
            self.sink.emit(ProgressEvent::TableDone {
                table: &table.name,
                rows: 0,
            });
            return Ok(0);
        }

        let total_rows = source.count_rows(&table.name, options.limit_rows).await?;
        self.sink.emit(ProgressEvent::TableStarted {
            table: &table.name,
            total_rows,
        });

        if total_rows == 0 {
            self.sink.emit(ProgressEvent::TableDone {
                table: &table.name,
                rows: 0,
            });
            return Ok(0);
        }

        // one transient reconnection attempt per table; a second loss in
        // the same table is fatal
        let rows = match self.stream_table(source, target, table, total_rows).await {
            Ok(rows) => rows,
            Err(err) if lost_connection(&err) => {
                warn!("Connection to MySQL server lost. Attempting to reconnect.");
                self.stream_table(source, target, table, total_rows)
                    .await
                    .map_err(|retry_err| {
                        if lost_connection(&retry_err) {
                            TransferError::ConnectionLost {
                                table: table.name.clone(),
                                message: retry_err.to_string(),
                            }
                        } else {
                            retry_err
                        }
                    })?
            }
            Err(err) => return Err(err),
        };

        self.sink.emit(ProgressEvent::TableDone {
            table: &table.name,
            rows,
        });
        Ok(rows)
    }

    /// Stream one table's rows into the destination.
    ///
    /// Chunked mode commits after every chunk; unchunked mode runs one
    /// transaction for the whole table, flushing inserts in small fixed
    /// batches. Re-runs are harmless either way because inserts are
    /// `OR IGNORE`.
    async fn stream_table(
        &self,
        source: &MysqlSource,
        target: &SqliteTarget,
        table: &TableDescriptor,
        total_rows: u64,
    ) -> Result<u64> {
        let options = &self.config.options;

        let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
        let kinds = decode_plan(table)?;

        let select_sql = source.build_select_sql(&table.name, &columns, options.limit_rows)?;
        let insert_sql = target.build_insert_sql(&table.name, &columns)?;

        let rows = match options.chunk_size {
            Some(chunk) => {
                let mut rows_done: u64 = 0;
                source
                    .fetch_batches(
                        &table.name,
                        &select_sql,
                        &columns,
                        &kinds,
                        chunk,
                        options.buffered,
                        |batch| {
                            let mut writer = target.begin_write(&insert_sql)?;
                            writer.write_rows(&batch)?;
                            rows_done += writer.commit()?;
                            self.sink.emit(ProgressEvent::ChunkCommitted {
                                table: &table.name,
                                rows_done,
                                total_rows,
                            });
                            Ok(())
                        },
                    )
                    .await?
            }
            None => {
                let mut writer = target.begin_write(&insert_sql)?;
                let total = source
                    .fetch_batches(
                        &table.name,
                        &select_sql,
                        &columns,
                        &kinds,
                        UNCHUNKED_FLUSH_ROWS,
                        options.buffered,
                        |batch| {
                            writer.write_rows(&batch)?;
                            Ok(())
                        },
                    )
                    .await?;
                writer.commit()?;
                total
            }
        };

        Ok(rows)
    }

    fn warn(&self, message: String) {
        self.sink.emit(ProgressEvent::Warning { message: &message });
    }
}

/// Parse each column's declared type into its decode plan.
fn decode_plan(table: &TableDescriptor) -> Result<Vec<FieldKind>> {
    table
        .columns
        .iter()
        .map(|column| {
            let ty = SourceType::parse(&column.declared_type)
                .map_err(|msg| TransferError::schema(&table.name, &column.name, msg))?;
            Ok(FieldKind::from_source(&ty))
        })
        .collect()
}

fn lost_connection(err: &TransferError) -> bool {
    matches!(err, TransferError::Source(e) if is_connection_lost(e))
}
