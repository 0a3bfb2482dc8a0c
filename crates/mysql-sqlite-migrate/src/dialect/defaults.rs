//! Translation of MySQL column defaults into SQLite `DEFAULT` clauses.
//!
//! The catalog reports defaults in raw source form: literals, bit/hex
//! literals, charset-introduced strings (`_utf8mb4'x'`), temporal keywords
//! with or without parentheses, and (on MySQL 8) arbitrary parenthesized
//! expressions. Everything with a portable SQLite meaning is mapped; the
//! rest is either quoted as an opaque text literal or, for expression
//! defaults, dropped with a warning.

/// Character-set introducers a default literal may be prefixed with.
pub const CHARSET_INTRODUCERS: &[&str] = &[
    "_utf8mb4", "_utf8mb3", "_utf8", "_utf16le", "_utf16", "_utf32", "_ucs2", "_latin1",
    "_latin2", "_latin5", "_latin7", "_ascii", "_binary", "_big5", "_gbk", "_gb2312",
    "_gb18030", "_cp1250", "_cp1251", "_cp1256", "_cp1257", "_cp850", "_cp852", "_cp866",
    "_cp932", "_sjis", "_tis620", "_euckr", "_eucjpms", "_ujis", "_koi8r", "_koi8u",
    "_greek", "_hebrew", "_armscii8", "_keybcs2", "_macce", "_macroman", "_dec8", "_hp8",
    "_swe7", "_geostd8",
];

/// Outcome of translating one column default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultClause {
    /// No default emitted.
    None,
    /// A complete clause, e.g. `DEFAULT 10` or `DEFAULT CURRENT_TIMESTAMP`.
    Clause(String),
    /// A non-portable expression default was dropped; carries the raw
    /// expression for the warning.
    DroppedExpression(String),
}

impl DefaultClause {
    /// The clause text, if one was produced.
    pub fn as_sql(&self) -> Option<&str> {
        match self {
            DefaultClause::Clause(sql) => Some(sql),
            _ => None,
        }
    }
}

/// Translate a raw MySQL default into a SQLite `DEFAULT` clause.
///
/// `generated` is true when `EXTRA` marks the default as an expression
/// (`DEFAULT_GENERATED`, generated columns). `nullable` decides whether an
/// explicit source `NULL` surfaces as `DEFAULT NULL`.
pub fn translate_default(default: Option<&str>, generated: bool, nullable: bool) -> DefaultClause {
    let raw = match default {
        Some(raw) => raw.trim(),
        None => return DefaultClause::None,
    };

    if raw.is_empty() {
        return DefaultClause::None;
    }

    if raw.eq_ignore_ascii_case("null") {
        if nullable {
            return DefaultClause::Clause("DEFAULT NULL".to_string());
        }
        return DefaultClause::None;
    }

    if raw.eq_ignore_ascii_case("true") {
        return DefaultClause::Clause("DEFAULT 1".to_string());
    }
    if raw.eq_ignore_ascii_case("false") {
        return DefaultClause::Clause("DEFAULT 0".to_string());
    }

    if is_numeric_literal(raw) {
        return DefaultClause::Clause(format!("DEFAULT {}", raw));
    }

    if let Some(value) = parse_bit_literal(raw) {
        return DefaultClause::Clause(format!("DEFAULT {}", value));
    }

    if let Some(hex) = parse_hex_literal(raw) {
        return DefaultClause::Clause(format!("DEFAULT x'{}'", hex));
    }

    if let Some(rest) = strip_charset_introducer(raw) {
        let rest = rest.trim_start();
        if let Some(value) = parse_bit_literal(rest) {
            return DefaultClause::Clause(format!("DEFAULT {}", value));
        }
        if let Some(hex) = parse_hex_literal(rest) {
            return DefaultClause::Clause(format!("DEFAULT x'{}'", hex));
        }
        if let Some(inner) = unquote(rest) {
            return DefaultClause::Clause(format!("DEFAULT '{}'", requote(&inner)));
        }
        // introducer with no recognizable literal behind it
        return DefaultClause::Clause(format!("DEFAULT '{}'", requote(rest)));
    }

    if let Some(keyword) = temporal_keyword(raw) {
        return DefaultClause::Clause(format!("DEFAULT {}", keyword));
    }

    if let Some(inner) = unquote(raw) {
        return DefaultClause::Clause(format!("DEFAULT '{}'", requote(&inner)));
    }

    // MySQL 8 expression defaults arrive parenthesized, e.g. (uuid()),
    // (json_object()); generated columns carry bare expressions.
    if (raw.starts_with('(') && raw.ends_with(')')) || generated {
        return DefaultClause::DroppedExpression(raw.to_string());
    }

    DefaultClause::Clause(format!("DEFAULT '{}'", requote(raw)))
}

/// Integer or float literal, verbatim-safe for SQLite.
fn is_numeric_literal(raw: &str) -> bool {
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return false;
    }
    raw.parse::<i128>().is_ok() || raw.parse::<f64>().is_ok()
}

/// Parse `b'0101'` / `B'0101'` into its integer value.
fn parse_bit_literal(raw: &str) -> Option<u64> {
    let rest = raw
        .strip_prefix("b'")
        .or_else(|| raw.strip_prefix("B'"))?
        .strip_suffix('\'')?;
    if rest.is_empty() || rest.len() > 64 {
        return None;
    }
    u64::from_str_radix(rest, 2).ok()
}

/// Parse `x'2A'` / `X'2A'` into lowercase hex digits.
fn parse_hex_literal(raw: &str) -> Option<String> {
    let rest = raw
        .strip_prefix("x'")
        .or_else(|| raw.strip_prefix("X'"))?
        .strip_suffix('\'')?;
    if rest.is_empty() || rest.len() % 2 != 0 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(rest.to_lowercase())
}

/// Strip a leading charset introducer, returning the remainder.
fn strip_charset_introducer(raw: &str) -> Option<&str> {
    for introducer in CHARSET_INTRODUCERS {
        if let Some(rest) = raw.strip_prefix(introducer) {
            // the introducer must be followed by the literal, not be part of
            // a longer word
            if rest.starts_with('\'') || rest.starts_with(' ') {
                return Some(rest);
            }
        }
    }
    None
}

/// Recognize the temporal default keywords, with or without call
/// parentheses and fractional-seconds specifier.
fn temporal_keyword(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    let base = match lower.find('(') {
        Some(open) => {
            let close = lower.rfind(')')?;
            let args = lower[open + 1..close].trim();
            if !args.is_empty() && args.parse::<u32>().is_err() {
                return None;
            }
            lower[..open].trim_end().to_string()
        }
        None => lower.clone(),
    };

    match base.as_str() {
        "current_timestamp" | "now" | "localtime" | "localtimestamp" => Some("CURRENT_TIMESTAMP"),
        "current_date" | "curdate" => Some("CURRENT_DATE"),
        "current_time" | "curtime" => Some("CURRENT_TIME"),
        _ => None,
    }
}

/// If `raw` is a complete single-quoted literal, return its unescaped
/// contents.
fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    // reject 'a' || 'b' style compounds where the quotes do not wrap the
    // whole literal
    let unescaped = inner.replace("\\'", "'").replace("''", "'");
    let quote_free = inner.replace("\\'", "").replace("''", "");
    if quote_free.contains('\'') {
        return None;
    }
    Some(unescaped)
}

/// Escape a text value for embedding in a single-quoted SQLite literal.
fn requote(value: &str) -> String {
    value.replace("\\'", "'").replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(raw: &str) -> String {
        match translate_default(Some(raw), false, true) {
            DefaultClause::Clause(sql) => sql,
            other => panic!("expected clause for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_no_default() {
        assert_eq!(translate_default(None, false, true), DefaultClause::None);
        assert_eq!(translate_default(Some(""), false, true), DefaultClause::None);
    }

    #[test]
    fn test_explicit_null() {
        assert_eq!(clause("NULL"), "DEFAULT NULL");
        // NOT NULL column with a reported NULL default emits nothing
        assert_eq!(translate_default(Some("NULL"), false, false), DefaultClause::None);
    }

    #[test]
    fn test_numeric_literals_pass_through() {
        assert_eq!(clause("0"), "DEFAULT 0");
        assert_eq!(clause("42"), "DEFAULT 42");
        assert_eq!(clause("-17"), "DEFAULT -17");
        assert_eq!(clause("3.14"), "DEFAULT 3.14");
        assert_eq!(clause("1e5"), "DEFAULT 1e5");
    }

    #[test]
    fn test_bit_literal_to_integer() {
        // BIT(4) DEFAULT b'1010' becomes DEFAULT 10
        assert_eq!(clause("b'1010'"), "DEFAULT 10");
        assert_eq!(clause("B'0101'"), "DEFAULT 5");
        assert_eq!(clause("b'0'"), "DEFAULT 0");
        assert_eq!(clause("b'11111111'"), "DEFAULT 255");
    }

    #[test]
    fn test_hex_literal_to_blob() {
        assert_eq!(clause("x'2A'"), "DEFAULT x'2a'");
        assert_eq!(clause("X'DEADBEEF'"), "DEFAULT x'deadbeef'");
    }

    #[test]
    fn test_charset_introducer_stripped() {
        assert_eq!(clause("_utf8mb4'hello'"), "DEFAULT 'hello'");
        assert_eq!(clause("_latin1 'bonjour'"), "DEFAULT 'bonjour'");
        assert_eq!(clause("_utf8mb4 b'1010'"), "DEFAULT 10");
        assert_eq!(clause("_binary x'00ff'"), "DEFAULT x'00ff'");
    }

    #[test]
    fn test_temporal_keywords() {
        for raw in [
            "CURRENT_TIMESTAMP",
            "current_timestamp",
            "CURRENT_TIMESTAMP()",
            "current_timestamp(6)",
            "NOW()",
            "now(3)",
            "localtimestamp",
        ] {
            assert_eq!(clause(raw), "DEFAULT CURRENT_TIMESTAMP", "for {raw}");
        }
        for raw in ["CURRENT_DATE", "curdate()", "CURDATE()"] {
            assert_eq!(clause(raw), "DEFAULT CURRENT_DATE", "for {raw}");
        }
        for raw in ["CURRENT_TIME", "curtime()", "current_time(3)"] {
            assert_eq!(clause(raw), "DEFAULT CURRENT_TIME", "for {raw}");
        }
    }

    #[test]
    fn test_quoted_string_literal() {
        assert_eq!(clause("'active'"), "DEFAULT 'active'");
        assert_eq!(clause("'it''s'"), "DEFAULT 'it''s'");
        assert_eq!(clause(r"'it\'s'"), "DEFAULT 'it''s'");
    }

    #[test]
    fn test_bare_string_quoted_as_opaque_literal() {
        // pre-8.0 catalogs report string defaults without quotes
        assert_eq!(clause("active"), "DEFAULT 'active'");
        assert_eq!(clause("O'Brien"), "DEFAULT 'O''Brien'");
    }

    #[test]
    fn test_expression_default_dropped() {
        for raw in ["(uuid())", "(json_object())", "(now() + interval 1 day)"] {
            match translate_default(Some(raw), true, true) {
                DefaultClause::DroppedExpression(expr) => assert_eq!(expr, raw),
                other => panic!("expected drop for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_generated_bare_expression_dropped() {
        // GENERATED ALWAYS AS (...) columns report a bare expression with
        // the generated marker set
        match translate_default(Some("upper(name)"), true, true) {
            DefaultClause::DroppedExpression(expr) => assert_eq!(expr, "upper(name)"),
            other => panic!("expected drop, got {other:?}"),
        }
    }

    #[test]
    fn test_true_false() {
        assert_eq!(clause("TRUE"), "DEFAULT 1");
        assert_eq!(clause("false"), "DEFAULT 0");
    }
}
