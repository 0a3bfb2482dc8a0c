//! Core types shared across the engine: schema descriptors, identifier
//! quoting, and the value adapter.

pub mod identifier;
pub mod schema;
pub mod value;

pub use schema::{
    ColumnDescriptor, FkAction, ForeignKeyDescriptor, IndexColumn, IndexDescriptor, IndexKind,
    TableDescriptor, TableKind,
};
pub use value::{FieldKind, SqliteValue, ValueDecodeError};
