//! Identifier validation and quoting for dynamic SQL.
//!
//! Identifiers (table, column, and index names) cannot be passed as
//! parameters in prepared statements, so every piece of dynamic SQL built by
//! the engine goes through these functions: validate first, then apply the
//! dialect's quoting with internal quote characters escaped.

use crate::error::{Result, TransferError};

/// Maximum identifier length. MySQL caps identifiers at 64 characters;
/// SQLite has no hard limit, so the source's rule is the binding one.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier before it is interpolated into SQL.
///
/// Rejects empty identifiers, identifiers containing null bytes, and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TransferError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(TransferError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(TransferError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a SQLite identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
pub fn quote_sqlite(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier using backticks.
///
/// Escapes backticks by doubling them and wraps in backticks.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_sqlite() {
        assert_eq!(quote_sqlite("users").unwrap(), "\"users\"");
        assert_eq!(quote_sqlite("odd\"name").unwrap(), "\"odd\"\"name\"");
    }

    #[test]
    fn test_quote_mysql() {
        assert_eq!(quote_mysql("users").unwrap(), "`users`");
        assert_eq!(quote_mysql("odd`name").unwrap(), "`odd``name`");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(quote_sqlite("").is_err());
        assert!(quote_mysql("").is_err());
    }

    #[test]
    fn test_rejects_null_byte() {
        assert!(quote_sqlite("a\0b").is_err());
    }

    #[test]
    fn test_rejects_overlong() {
        let name = "x".repeat(65);
        assert!(quote_sqlite(&name).is_err());
        assert!(quote_sqlite(&"x".repeat(64)).is_ok());
    }
}
