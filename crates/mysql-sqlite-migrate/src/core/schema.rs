//! Schema and metadata types for source tables, columns, indices, and
//! constraints.
//!
//! These types are the in-memory model between introspection and DDL
//! emission. They are built once per run by the introspector, consumed by the
//! DDL emitter and the row streamer, and discarded when the run ends.

use serde::{Deserialize, Serialize};

/// Column metadata as reported by `information_schema.COLUMNS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name (case-preserving).
    pub name: String,

    /// Full declared type string, e.g. `int(11) unsigned`, `decimal(10,2)`,
    /// `enum('a','b')`.
    pub declared_type: String,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Raw default expression as reported by the catalog, if any.
    pub default: Option<String>,

    /// `EXTRA` contains `auto_increment`.
    pub auto_increment: bool,

    /// `EXTRA` contains an `on update` clause (informational only; dropped).
    pub has_on_update: bool,

    /// `EXTRA` marks the default as generated (`DEFAULT_GENERATED`,
    /// `GENERATED ALWAYS AS ...`). Such defaults are expressions, not
    /// literals.
    pub default_generated: bool,

    /// Character set, for text types.
    pub charset: Option<String>,

    /// Collation, for text types.
    pub collation: Option<String>,
}

/// Index classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Primary,
    Unique,
    NonUnique,
    /// Dropped with a warning; SQLite has no FULLTEXT indices.
    FullText,
    /// Dropped with a warning; SQLite has no spatial indices.
    Spatial,
}

/// A single column participating in an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,

    /// Prefix length (`SUB_PART`), ignored when emitting.
    pub prefix_len: Option<u32>,
}

/// Index metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Source index name. `PRIMARY` denotes the primary key.
    pub name: String,

    /// Indexed columns in `SEQ_IN_INDEX` order.
    pub columns: Vec<IndexColumn>,

    /// Kind of index.
    pub kind: IndexKind,
}

impl IndexDescriptor {
    /// Whether this descriptor is the primary key.
    pub fn is_primary(&self) -> bool {
        self.kind == IndexKind::Primary
    }

    /// Column names without prefix lengths.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Referential action on update/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FkAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl FkAction {
    /// Parse the catalog's `UPDATE_RULE`/`DELETE_RULE` value.
    /// Unknown rules degrade to `NO ACTION`, matching SQLite's default.
    pub fn parse(rule: &str) -> Self {
        match rule.trim().to_uppercase().as_str() {
            "RESTRICT" => FkAction::Restrict,
            "CASCADE" => FkAction::Cascade,
            "SET NULL" => FkAction::SetNull,
            "SET DEFAULT" => FkAction::SetDefault,
            _ => FkAction::NoAction,
        }
    }

    /// SQLite clause text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            FkAction::Restrict => "RESTRICT",
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::NoAction => "NO ACTION",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Constraint name.
    pub name: String,

    /// Local column names, ordered.
    pub columns: Vec<String>,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column names, ordered.
    pub ref_columns: Vec<String>,

    /// ON UPDATE action.
    pub on_update: FkAction,

    /// ON DELETE action.
    pub on_delete: FkAction,
}

/// Whether the source object is a base table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    BaseTable,
    View,
}

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,

    /// Base table or view.
    pub kind: TableKind,

    /// Column definitions in ordinal order.
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column names, ordered.
    pub primary_key: Vec<String>,

    /// Secondary indices (everything but `PRIMARY`).
    pub indices: Vec<IndexDescriptor>,

    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    /// Whether the table has a single-column primary key.
    pub fn has_single_pk(&self) -> bool {
        self.primary_key.len() == 1
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check the structural invariant that every column referenced by an
    /// index or foreign key appears in the column list.
    pub fn check_references(&self) -> std::result::Result<(), String> {
        for idx in &self.indices {
            for col in &idx.columns {
                if self.column(&col.name).is_none() {
                    return Err(format!(
                        "index {:?} references unknown column {:?}",
                        idx.name, col.name
                    ));
                }
            }
        }
        for fk in &self.foreign_keys {
            for col in &fk.columns {
                if self.column(col).is_none() {
                    return Err(format!(
                        "foreign key {:?} references unknown column {:?}",
                        fk.name, col
                    ));
                }
            }
        }
        Ok(())
    }
}
