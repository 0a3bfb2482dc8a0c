//! Type mapping from MySQL declared column types to SQLite column types.
//!
//! The raw `COLUMN_TYPE` string from the catalog (e.g. `int(11) unsigned`,
//! `decimal(10,2)`, `enum('a','b')`) is parsed into a tagged [`SourceType`],
//! one variant per MySQL family carrying its parameters. A total function
//! then maps every variant to a [`SqliteType`]. Unknown families fail at
//! parse time, so translation itself cannot fail.

use std::fmt;

/// A parsed MySQL column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    TinyInt { width: Option<u32>, unsigned: bool },
    SmallInt { unsigned: bool },
    MediumInt { unsigned: bool },
    Int { unsigned: bool },
    BigInt { unsigned: bool },
    Year,
    Bit { bits: u32 },
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    Char { len: Option<u32> },
    VarChar { len: Option<u32> },
    TinyText,
    Text,
    MediumText,
    LongText,
    Enum { members: Vec<String> },
    Set { members: Vec<String> },
    Date,
    DateTime { fsp: Option<u32> },
    Timestamp { fsp: Option<u32> },
    Time { fsp: Option<u32> },
    Binary { len: Option<u32> },
    VarBinary { len: Option<u32> },
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Json,
    /// `GEOMETRY`, `POINT`, `LINESTRING`, ... stored as BLOB with a warning.
    Spatial { family: String },
}

impl SourceType {
    /// Parse a raw `COLUMN_TYPE` string.
    ///
    /// Returns an error message naming the unknown type when the family is
    /// not recognized; the caller attaches the table and column names.
    pub fn parse(raw: &str) -> Result<SourceType, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty column type".to_string());
        }

        let lower = trimmed.to_lowercase();
        let (base, args) = split_base_and_args(&lower);
        let unsigned = lower.contains("unsigned");

        let ty = match base {
            "tinyint" => SourceType::TinyInt {
                width: first_u32(&args),
                unsigned,
            },
            "bool" | "boolean" => SourceType::TinyInt {
                width: Some(1),
                unsigned: false,
            },
            "smallint" => SourceType::SmallInt { unsigned },
            "mediumint" => SourceType::MediumInt { unsigned },
            "int" | "integer" => SourceType::Int { unsigned },
            "bigint" => SourceType::BigInt { unsigned },
            // SERIAL is an alias for BIGINT UNSIGNED NOT NULL AUTO_INCREMENT
            "serial" => SourceType::BigInt { unsigned: true },
            "year" => SourceType::Year,
            "bit" => SourceType::Bit {
                bits: first_u32(&args).unwrap_or(1),
            },
            "float" => SourceType::Float,
            "double" | "double precision" | "real" => SourceType::Double,
            "decimal" | "numeric" | "fixed" | "dec" => SourceType::Decimal {
                precision: first_u32(&args).unwrap_or(10),
                scale: second_u32(&args).unwrap_or(0),
            },
            "char" | "character" | "nchar" | "national character" => SourceType::Char {
                len: first_u32(&args),
            },
            "varchar"
            | "character varying"
            | "char varying"
            | "nvarchar"
            | "national varchar"
            | "national character varying"
            | "national char varying" => SourceType::VarChar {
                len: first_u32(&args),
            },
            "tinytext" => SourceType::TinyText,
            "text" => SourceType::Text,
            "mediumtext" => SourceType::MediumText,
            "longtext" => SourceType::LongText,
            "enum" => SourceType::Enum {
                members: quoted_members(&args),
            },
            "set" => SourceType::Set {
                members: quoted_members(&args),
            },
            "date" => SourceType::Date,
            "datetime" => SourceType::DateTime {
                fsp: first_u32(&args),
            },
            "timestamp" => SourceType::Timestamp {
                fsp: first_u32(&args),
            },
            "time" => SourceType::Time {
                fsp: first_u32(&args),
            },
            "binary" => SourceType::Binary {
                len: first_u32(&args),
            },
            "varbinary" => SourceType::VarBinary {
                len: first_u32(&args),
            },
            "tinyblob" => SourceType::TinyBlob,
            "blob" => SourceType::Blob,
            "mediumblob" => SourceType::MediumBlob,
            "longblob" => SourceType::LongBlob,
            "json" => SourceType::Json,
            "geometry" | "point" | "linestring" | "polygon" | "multipoint"
            | "multilinestring" | "multipolygon" | "geometrycollection" | "geomcollection" => {
                SourceType::Spatial {
                    family: base.to_uppercase(),
                }
            }
            other => return Err(format!("unknown MySQL type {:?}", other)),
        };

        Ok(ty)
    }

    /// Whether this is the `TINYINT(1)` boolean convention.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            SourceType::TinyInt {
                width: Some(1),
                ..
            }
        )
    }
}

/// A SQLite column type as emitted into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteType {
    Integer,
    Real,
    Text,
    Blob,
    Decimal { precision: u32, scale: u32 },
    Date,
    DateTime,
    Time,
    Json,
}

impl SqliteType {
    /// Whether the column has TEXT affinity, i.e. is eligible for a
    /// `COLLATE` clause.
    pub fn is_text_affine(&self) -> bool {
        matches!(self, SqliteType::Text)
    }

    /// Whether the declared type resolves to the INTEGER storage class,
    /// which is what `INTEGER PRIMARY KEY AUTOINCREMENT` requires.
    pub fn is_integer(&self) -> bool {
        matches!(self, SqliteType::Integer)
    }

    /// Narrow to the five types STRICT tables accept. `DECIMAL`, `DATE`,
    /// `DATETIME`, `TIME`, and `JSON` all store text and downgrade to TEXT.
    pub fn narrow_for_strict(self) -> SqliteType {
        match self {
            SqliteType::Integer | SqliteType::Real | SqliteType::Text | SqliteType::Blob => self,
            SqliteType::Decimal { .. }
            | SqliteType::Date
            | SqliteType::DateTime
            | SqliteType::Time
            | SqliteType::Json => SqliteType::Text,
        }
    }
}

impl fmt::Display for SqliteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqliteType::Integer => write!(f, "INTEGER"),
            SqliteType::Real => write!(f, "REAL"),
            SqliteType::Text => write!(f, "TEXT"),
            SqliteType::Blob => write!(f, "BLOB"),
            SqliteType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({},{})", precision, scale)
            }
            SqliteType::Date => write!(f, "DATE"),
            SqliteType::DateTime => write!(f, "DATETIME"),
            SqliteType::Time => write!(f, "TIME"),
            SqliteType::Json => write!(f, "JSON"),
        }
    }
}

/// Preferences that shape the translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeOptions {
    /// Destination build has the JSON1 functions.
    pub json1_available: bool,

    /// Emit STRICT tables; implies narrowing to the strict type set.
    pub strict: bool,

    /// Force JSON columns to TEXT regardless of JSON1 availability.
    pub json_as_text: bool,
}

/// Result of translating one source type.
#[derive(Debug, Clone)]
pub struct Translated {
    /// The SQLite column type.
    pub sqlite: SqliteType,

    /// Warning to surface for lossy mappings (spatial types).
    pub warning: Option<String>,
}

impl Translated {
    fn lossless(sqlite: SqliteType) -> Self {
        Self {
            sqlite,
            warning: None,
        }
    }

    fn lossy(sqlite: SqliteType, warning: impl Into<String>) -> Self {
        Self {
            sqlite,
            warning: Some(warning.into()),
        }
    }
}

/// Map a parsed MySQL type to its SQLite column type.
///
/// Total over [`SourceType`]; lossy mappings carry a warning.
pub fn translate(ty: &SourceType, opts: TypeOptions) -> Translated {
    let mut out = match ty {
        SourceType::TinyInt { .. }
        | SourceType::SmallInt { .. }
        | SourceType::MediumInt { .. }
        | SourceType::Int { .. }
        | SourceType::BigInt { .. }
        | SourceType::Year => Translated::lossless(SqliteType::Integer),

        SourceType::Bit { bits } => {
            if *bits <= 8 {
                Translated::lossless(SqliteType::Integer)
            } else {
                Translated::lossless(SqliteType::Blob)
            }
        }

        SourceType::Float | SourceType::Double => Translated::lossless(SqliteType::Real),

        SourceType::Decimal { precision, scale } => Translated::lossless(SqliteType::Decimal {
            precision: *precision,
            scale: *scale,
        }),

        SourceType::Char { .. }
        | SourceType::VarChar { .. }
        | SourceType::TinyText
        | SourceType::Text
        | SourceType::MediumText
        | SourceType::LongText
        | SourceType::Enum { .. }
        | SourceType::Set { .. } => Translated::lossless(SqliteType::Text),

        SourceType::Date => Translated::lossless(SqliteType::Date),
        SourceType::DateTime { .. } | SourceType::Timestamp { .. } => {
            Translated::lossless(SqliteType::DateTime)
        }
        SourceType::Time { .. } => Translated::lossless(SqliteType::Time),

        SourceType::Binary { .. }
        | SourceType::VarBinary { .. }
        | SourceType::TinyBlob
        | SourceType::Blob
        | SourceType::MediumBlob
        | SourceType::LongBlob => Translated::lossless(SqliteType::Blob),

        SourceType::Json => {
            if opts.json1_available && !opts.json_as_text {
                Translated::lossless(SqliteType::Json)
            } else {
                Translated::lossless(SqliteType::Text)
            }
        }

        SourceType::Spatial { family } => Translated::lossy(
            SqliteType::Blob,
            format!("spatial type {} stored as BLOB; spatial operations unavailable", family),
        ),
    };

    if opts.strict {
        out.sqlite = out.sqlite.narrow_for_strict();
    }

    out
}

/// Split `varchar(32) unsigned` into (`varchar`, `32`).
///
/// The base may be a multi-word synonym (`double precision`,
/// `national character varying`); trailing attributes (`unsigned`,
/// `zerofill`, charset clauses) are not part of the base.
fn split_base_and_args(lower: &str) -> (&str, String) {
    let (head, args) = match lower.find('(') {
        Some(open) => {
            let close = lower.rfind(')').unwrap_or(lower.len());
            (&lower[..open], lower[open + 1..close].to_string())
        }
        None => (lower, String::new()),
    };

    let head = head.trim();
    // strip trailing attribute words from a parenless declaration like
    // "int unsigned zerofill"
    let base = head
        .split_whitespace()
        .filter(|w| !matches!(*w, "unsigned" | "zerofill" | "signed"))
        .collect::<Vec<_>>()
        .join(" ");

    // the base has to be returned as a slice of a stable buffer; find it
    // back in the input so the caller gets a &str without allocation churn
    match lower.find(base.as_str()) {
        Some(pos) => (&lower[pos..pos + base.len()], args),
        None => ("", args),
    }
}

fn first_u32(args: &str) -> Option<u32> {
    args.split(',').next()?.trim().parse().ok()
}

fn second_u32(args: &str) -> Option<u32> {
    args.split(',').nth(1)?.trim().parse().ok()
}

/// Parse `'a','b','c'` into the member list, honoring `''` escapes.
fn quoted_members(args: &str) -> Vec<String> {
    let mut members = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = args.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quote {
            if ch == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    current.push('\'');
                } else {
                    in_quote = false;
                    members.push(std::mem::take(&mut current));
                }
            } else {
                current.push(ch);
            }
        } else if ch == '\'' {
            in_quote = true;
        }
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(raw: &str) -> SqliteType {
        let ty = SourceType::parse(raw).unwrap();
        translate(&ty, TypeOptions::default()).sqlite
    }

    #[test]
    fn test_integer_family() {
        for raw in [
            "tinyint(4)",
            "smallint(6)",
            "mediumint(9)",
            "int(11)",
            "int unsigned",
            "int(10) unsigned",
            "bigint(20)",
            "bigint unsigned",
            "serial",
            "year(4)",
            "year",
            "boolean",
        ] {
            assert_eq!(translated(raw), SqliteType::Integer, "for {raw}");
        }
    }

    #[test]
    fn test_bit_by_size() {
        for bits in 1..=8 {
            assert_eq!(translated(&format!("bit({bits})")), SqliteType::Integer);
        }
        for bits in [9u32, 16, 33, 64] {
            assert_eq!(translated(&format!("bit({bits})")), SqliteType::Blob);
        }
        // bare BIT is BIT(1)
        assert_eq!(translated("bit"), SqliteType::Integer);
    }

    #[test]
    fn test_float_family() {
        assert_eq!(translated("float"), SqliteType::Real);
        assert_eq!(translated("double"), SqliteType::Real);
        assert_eq!(translated("double precision"), SqliteType::Real);
        assert_eq!(translated("real"), SqliteType::Real);
    }

    #[test]
    fn test_decimal_keeps_parameters() {
        for (p, s) in [(1u32, 0u32), (5, 2), (10, 2), (18, 6), (38, 10), (65, 30)] {
            let raw = format!("decimal({p},{s})");
            assert_eq!(
                translated(&raw),
                SqliteType::Decimal {
                    precision: p,
                    scale: s
                },
                "for {raw}"
            );
            assert_eq!(translated(&raw).to_string(), format!("DECIMAL({p},{s})"));
        }
        assert_eq!(
            translated("numeric(8,3)"),
            SqliteType::Decimal {
                precision: 8,
                scale: 3
            }
        );
        assert_eq!(
            translated("fixed(6,2)"),
            SqliteType::Decimal {
                precision: 6,
                scale: 2
            }
        );
    }

    #[test]
    fn test_text_family() {
        for raw in [
            "char(3)",
            "varchar(32)",
            "tinytext",
            "text",
            "mediumtext",
            "longtext",
            "national varchar(10)",
            "character varying(20)",
            "enum('a','b')",
            "set('x','y','z')",
        ] {
            assert_eq!(translated(raw), SqliteType::Text, "for {raw}");
        }
    }

    #[test]
    fn test_enum_member_lists() {
        // stable output across varied member lists, including quote escapes
        let cases: &[(&str, &[&str])] = &[
            ("enum('a')", &["a"]),
            ("enum('a','b','c')", &["a", "b", "c"]),
            ("enum('it''s','plain')", &["it's", "plain"]),
            ("set('r','w','x')", &["r", "w", "x"]),
        ];
        for (raw, expected) in cases {
            match SourceType::parse(raw).unwrap() {
                SourceType::Enum { members } | SourceType::Set { members } => {
                    assert_eq!(members, *expected, "for {raw}");
                }
                other => panic!("unexpected parse for {raw}: {other:?}"),
            }
            assert_eq!(translated(raw), SqliteType::Text);
        }
    }

    #[test]
    fn test_temporal_family() {
        assert_eq!(translated("date"), SqliteType::Date);
        assert_eq!(translated("datetime"), SqliteType::DateTime);
        assert_eq!(translated("datetime(6)"), SqliteType::DateTime);
        assert_eq!(translated("timestamp"), SqliteType::DateTime);
        assert_eq!(translated("time"), SqliteType::Time);
        assert_eq!(translated("time(3)"), SqliteType::Time);
    }

    #[test]
    fn test_binary_family() {
        for raw in [
            "binary(16)",
            "varbinary(255)",
            "tinyblob",
            "blob",
            "mediumblob",
            "longblob",
        ] {
            assert_eq!(translated(raw), SqliteType::Blob, "for {raw}");
        }
    }

    #[test]
    fn test_json_gating() {
        let ty = SourceType::parse("json").unwrap();

        let with_json1 = TypeOptions {
            json1_available: true,
            ..Default::default()
        };
        assert_eq!(translate(&ty, with_json1).sqlite, SqliteType::Json);

        let without_json1 = TypeOptions::default();
        assert_eq!(translate(&ty, without_json1).sqlite, SqliteType::Text);

        let forced_text = TypeOptions {
            json1_available: true,
            json_as_text: true,
            ..Default::default()
        };
        assert_eq!(translate(&ty, forced_text).sqlite, SqliteType::Text);
    }

    #[test]
    fn test_spatial_is_blob_with_warning() {
        for raw in ["geometry", "point", "polygon", "multipoint", "geomcollection"] {
            let ty = SourceType::parse(raw).unwrap();
            let out = translate(&ty, TypeOptions::default());
            assert_eq!(out.sqlite, SqliteType::Blob, "for {raw}");
            assert!(out.warning.is_some(), "for {raw}");
        }
    }

    #[test]
    fn test_unknown_type_errors() {
        for raw in ["blobby", "uniqueidentifier", "hstore", ""] {
            assert!(SourceType::parse(raw).is_err(), "for {raw:?}");
        }
    }

    #[test]
    fn test_strict_narrowing() {
        let strict = TypeOptions {
            json1_available: true,
            strict: true,
            ..Default::default()
        };
        for (raw, expected) in [
            ("decimal(10,2)", SqliteType::Text),
            ("date", SqliteType::Text),
            ("datetime", SqliteType::Text),
            ("time", SqliteType::Text),
            ("json", SqliteType::Text),
            ("int(11)", SqliteType::Integer),
            ("double", SqliteType::Real),
            ("varchar(5)", SqliteType::Text),
            ("blob", SqliteType::Blob),
        ] {
            let ty = SourceType::parse(raw).unwrap();
            assert_eq!(translate(&ty, strict).sqlite, expected, "for {raw}");
        }
    }

    #[test]
    fn test_tinyint1_is_boolean() {
        assert!(SourceType::parse("tinyint(1)").unwrap().is_boolean());
        assert!(SourceType::parse("boolean").unwrap().is_boolean());
        assert!(!SourceType::parse("tinyint(4)").unwrap().is_boolean());
        assert!(!SourceType::parse("tinyint").unwrap().is_boolean());
    }
}
