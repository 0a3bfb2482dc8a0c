//! DDL emission: `CREATE TABLE` and `CREATE INDEX` statements from
//! introspected metadata.
//!
//! Per table, exactly one `CREATE TABLE IF NOT EXISTS` statement followed by
//! zero or more `CREATE INDEX IF NOT EXISTS` statements. Columns appear in
//! source ordinal order; a table-level `PRIMARY KEY(...)` follows the
//! columns unless collapsed into `INTEGER PRIMARY KEY AUTOINCREMENT`;
//! single-column uniques are inlined as table-level `UNIQUE(...)`; foreign
//! keys come last, when emission is permitted at all.

use std::collections::{HashMap, HashSet};

use crate::config::Collation;
use crate::core::identifier::quote_sqlite;
use crate::core::schema::{IndexDescriptor, IndexKind, TableDescriptor};
use crate::dialect::defaults::{translate_default, DefaultClause};
use crate::dialect::typemap::{translate, SourceType, TypeOptions};
use crate::error::{Result, TransferError};

/// Resolves emitted index names to be unique across the whole output
/// database.
///
/// MySQL index names are table-local; SQLite index names are
/// database-global. The policy: an empty source name becomes
/// `<table>_<col1>_..._<colN>`; a name colliding with a table name, or any
/// name when prefixing is requested, becomes `<table>_<sourcename>`; a
/// residual collision gains a numeric suffix.
#[derive(Debug, Default)]
pub struct IndexNamer {
    table_names: HashSet<String>,
    seen: HashSet<String>,
    counters: HashMap<String, u32>,
    prefix_indices: bool,
}

impl IndexNamer {
    /// Create a namer aware of every table name in the plan.
    pub fn new<I, S>(table_names: I, prefix_indices: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_names: table_names.into_iter().map(Into::into).collect(),
            seen: HashSet::new(),
            counters: HashMap::new(),
            prefix_indices,
        }
    }

    /// Resolve the emitted name for one index. Returns the name and, when a
    /// numeric suffix had to be applied, the rename notice.
    pub fn resolve(&mut self, table: &str, index: &IndexDescriptor) -> (String, Option<String>) {
        let base = if index.name.is_empty() {
            let cols = index
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("_");
            format!("{}_{}", table, cols)
        } else if self.prefix_indices || self.table_names.contains(&index.name) {
            format!("{}_{}", table, index.name)
        } else {
            index.name.clone()
        };

        if !self.table_names.contains(&base) && self.seen.insert(base.clone()) {
            return (base, None);
        }

        let mut next = *self.counters.get(&base).unwrap_or(&2);
        let mut candidate = format!("{}_{}", base, next);
        while self.table_names.contains(&candidate) || !self.seen.insert(candidate.clone()) {
            next += 1;
            candidate = format!("{}_{}", base, next);
        }
        self.counters.insert(base.clone(), next + 1);
        let notice = format!(
            "index {:?} renamed to {:?} to stay unique across the SQLite database",
            base, candidate
        );
        (candidate, Some(notice))
    }
}

/// DDL for one table: the CREATE TABLE statement plus its index statements.
#[derive(Debug, Clone)]
pub struct TableDdl {
    /// `CREATE TABLE IF NOT EXISTS ...`
    pub create_table: String,

    /// `CREATE [UNIQUE] INDEX IF NOT EXISTS ...`, one per secondary index.
    pub create_indices: Vec<String>,

    /// Non-fatal notices: dropped indices, dropped defaults, renames.
    pub warnings: Vec<String>,
}

impl TableDdl {
    /// All statements joined into one executable script.
    pub fn script(&self) -> String {
        let mut script = self.create_table.clone();
        script.push(';');
        for index in &self.create_indices {
            script.push('\n');
            script.push_str(index);
            script.push(';');
        }
        script
    }
}

/// Emits SQLite DDL from table descriptors, applying the type and default
/// translators and the index naming policy.
pub struct DdlEmitter {
    type_opts: TypeOptions,
    collation: Collation,
    emit_fks: bool,
    namer: IndexNamer,
}

impl DdlEmitter {
    /// Create an emitter for one run.
    pub fn new(
        type_opts: TypeOptions,
        collation: Collation,
        emit_fks: bool,
        namer: IndexNamer,
    ) -> Self {
        Self {
            type_opts,
            collation,
            emit_fks,
            namer,
        }
    }

    /// Build the DDL for one table.
    pub fn emit_table(&mut self, table: &TableDescriptor) -> Result<TableDdl> {
        table
            .check_references()
            .map_err(|msg| TransferError::schema(&table.name, "", msg))?;

        let mut warnings = Vec::new();
        let mut column_clauses = Vec::with_capacity(table.columns.len());

        // Decide whether the primary key collapses into
        // INTEGER PRIMARY KEY AUTOINCREMENT: single PK column, marked
        // auto_increment, integer-affine after translation.
        let collapse_pk = self.rowid_pk_column(table, &mut warnings)?;

        for column in &table.columns {
            let source_type = SourceType::parse(&column.declared_type).map_err(|msg| {
                TransferError::schema(&table.name, &column.name, msg)
            })?;
            let translated = translate(&source_type, self.type_opts);
            if let Some(warning) = translated.warning {
                warnings.push(format!("column {:?}: {}", column.name, warning));
            }
            let name = quote_sqlite(&column.name)?;

            if collapse_pk.as_deref() == Some(column.name.as_str()) {
                column_clauses.push(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name));
                continue;
            }

            let mut clause = format!("{} {}", name, translated.sqlite);
            if !column.nullable {
                clause.push_str(" NOT NULL");
            }

            match translate_default(
                column.default.as_deref(),
                column.default_generated,
                column.nullable,
            ) {
                DefaultClause::Clause(sql) => {
                    clause.push(' ');
                    clause.push_str(&sql);
                }
                DefaultClause::DroppedExpression(expr) => {
                    warnings.push(format!(
                        "expression default {:?} on column {:?} dropped; SQLite cannot express it",
                        expr, column.name
                    ));
                }
                DefaultClause::None => {}
            }

            if self.collation != Collation::Binary && translated.sqlite.is_text_affine() {
                clause.push_str(&format!(" COLLATE {}", self.collation.as_sql()));
            }

            column_clauses.push(clause);
        }

        // Table-level PRIMARY KEY, unless collapsed away.
        if collapse_pk.is_none() && !table.primary_key.is_empty() {
            let cols = table
                .primary_key
                .iter()
                .map(|c| quote_sqlite(c))
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            column_clauses.push(format!("PRIMARY KEY ({})", cols));
        }

        // Single-column uniques inline; everything else becomes an index
        // statement below.
        for index in &table.indices {
            if index.kind == IndexKind::Unique && index.columns.len() == 1 {
                column_clauses.push(format!(
                    "UNIQUE ({})",
                    quote_sqlite(&index.columns[0].name)?
                ));
            }
        }

        if self.emit_fks {
            for fk in &table.foreign_keys {
                let cols = fk
                    .columns
                    .iter()
                    .map(|c| quote_sqlite(c))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                let ref_cols = fk
                    .ref_columns
                    .iter()
                    .map(|c| quote_sqlite(c))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                column_clauses.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
                    cols,
                    quote_sqlite(&fk.ref_table)?,
                    ref_cols,
                    fk.on_update.as_sql(),
                    fk.on_delete.as_sql(),
                ));
            }
        }

        let mut create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_sqlite(&table.name)?,
            column_clauses.join(", ")
        );
        if self.type_opts.strict {
            create_table.push_str(" STRICT");
        }

        let create_indices = self.emit_indices(table, &mut warnings)?;

        Ok(TableDdl {
            create_table,
            create_indices,
            warnings,
        })
    }

    /// The column name that collapses into `INTEGER PRIMARY KEY
    /// AUTOINCREMENT`, if the table qualifies.
    fn rowid_pk_column(
        &self,
        table: &TableDescriptor,
        warnings: &mut Vec<String>,
    ) -> Result<Option<String>> {
        if table.primary_key.len() != 1 {
            return Ok(None);
        }
        let pk_name = &table.primary_key[0];
        let column = match table.column(pk_name) {
            Some(column) => column,
            None => {
                return Err(TransferError::schema(
                    &table.name,
                    pk_name.clone(),
                    "primary key references unknown column",
                ))
            }
        };
        if !column.auto_increment {
            return Ok(None);
        }

        let source_type = SourceType::parse(&column.declared_type)
            .map_err(|msg| TransferError::schema(&table.name, &column.name, msg))?;
        if translate(&source_type, self.type_opts).sqlite.is_integer() {
            Ok(Some(column.name.clone()))
        } else {
            warnings.push(format!(
                "auto-increment primary key {:?} is not integer-affine; emitted as a plain column",
                column.name
            ));
            Ok(None)
        }
    }

    /// Emit `CREATE INDEX` statements for the secondary indices that survive
    /// translation.
    fn emit_indices(
        &mut self,
        table: &TableDescriptor,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();

        for index in &table.indices {
            match index.kind {
                IndexKind::Primary => continue,
                // inlined as a table-level UNIQUE constraint
                IndexKind::Unique if index.columns.len() == 1 => continue,
                IndexKind::FullText => {
                    warnings.push(format!(
                        "full-text index {:?} on table {:?} dropped",
                        index.name, table.name
                    ));
                    continue;
                }
                IndexKind::Spatial => {
                    warnings.push(format!(
                        "spatial index {:?} on table {:?} dropped",
                        index.name, table.name
                    ));
                    continue;
                }
                IndexKind::Unique | IndexKind::NonUnique => {}
            }

            let (name, renamed) = self.namer.resolve(&table.name, index);
            if let Some(notice) = renamed {
                warnings.push(notice);
            }

            let cols = index
                .columns
                .iter()
                .map(|c| quote_sqlite(&c.name))
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            let unique = if index.kind == IndexKind::Unique {
                "UNIQUE "
            } else {
                ""
            };
            statements.push(format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                unique,
                quote_sqlite(&name)?,
                quote_sqlite(&table.name)?,
                cols
            ));
        }

        Ok(statements)
    }
}
