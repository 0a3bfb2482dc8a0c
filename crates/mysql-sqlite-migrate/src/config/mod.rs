//! Run configuration: connection settings and behavior flags.

mod types;
mod validation;

pub use types::{Collation, Config, MysqlConfig, SqliteConfig, TransferOptions};
pub use validation::validate;
