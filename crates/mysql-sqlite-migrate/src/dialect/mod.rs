//! Translation between the MySQL and SQLite dialects: column types, default
//! clauses, and DDL emission.

pub mod ddl;
pub mod defaults;
pub mod typemap;

pub use ddl::{DdlEmitter, IndexNamer, TableDdl};
pub use defaults::{translate_default, DefaultClause};
pub use typemap::{translate, SourceType, SqliteType, TypeOptions};
