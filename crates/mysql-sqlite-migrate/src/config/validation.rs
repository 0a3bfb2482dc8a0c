//! Configuration validation.
//!
//! Fails fast, before any connection is opened. Every rejection names the
//! offending flag pair.

use super::Config;
use crate::error::{Result, TransferError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.mysql.database.is_empty() {
        return Err(TransferError::Config(
            "-d/--mysql-database is required".into(),
        ));
    }
    if config.mysql.user.is_empty() {
        return Err(TransferError::Config("-u/--mysql-user is required".into()));
    }
    if config.sqlite.file.as_os_str().is_empty() {
        return Err(TransferError::Config("-f/--sqlite-file is required".into()));
    }

    let options = &config.options;

    if !options.tables.is_empty() && !options.exclude_tables.is_empty() {
        return Err(TransferError::Config(
            "-t/--mysql-tables and -e/--exclude-mysql-tables are mutually exclusive".into(),
        ));
    }

    if options.without_tables && options.without_data {
        return Err(TransferError::Config(
            "-Z/--without-tables and -W/--without-data together leave nothing to do".into(),
        ));
    }

    if let Some(0) = options.chunk_size {
        return Err(TransferError::Config(
            "-c/--chunk must be at least 1".into(),
        ));
    }

    if let Some(0) = options.limit_rows {
        return Err(TransferError::Config(
            "-L/--limit-rows must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MysqlConfig, SqliteConfig, TransferOptions};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            mysql: MysqlConfig {
                database: "shop".to_string(),
                user: "reader".to_string(),
                ..Default::default()
            },
            sqlite: SqliteConfig {
                file: PathBuf::from("shop.sqlite3"),
            },
            options: TransferOptions::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_database() {
        let mut config = valid_config();
        config.mysql.database.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("--mysql-database"));
    }

    #[test]
    fn test_missing_user() {
        let mut config = valid_config();
        config.mysql.user.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_include_exclude_mutually_exclusive() {
        let mut config = valid_config();
        config.options.tables = vec!["users".to_string()];
        config.options.exclude_tables = vec!["logs".to_string()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_without_tables_and_data_rejected() {
        let mut config = valid_config();
        config.options.without_tables = true;
        config.options.without_data = true;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let mut config = valid_config();
        config.options.chunk_size = Some(0);
        assert!(validate(&config).is_err());
        config.options.chunk_size = Some(1);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = valid_config();
        config.options.limit_rows = Some(0);
        assert!(validate(&config).is_err());
    }
}
