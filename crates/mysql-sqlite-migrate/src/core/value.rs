//! Value adapter layer: SQLite storage classes and their conversions.
//!
//! On the read side, MySQL wire values are normalized into [`SqliteValue`],
//! one variant per SQLite storage class. Dates and times become ISO-8601
//! TEXT, decimals keep their exact digits as TEXT, binaries pass through
//! unmodified. On readback (used by tests and identity checks) the lenient
//! parsers reverse the temporal encodings: ISO-8601 first, then permissive
//! fallbacks; malformed values fail with [`ValueDecodeError`].

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;
use thiserror::Error;

use crate::dialect::typemap::SourceType;

/// A value in one of SQLite's five storage classes.
#[derive(Debug, Clone, PartialEq)]
pub enum SqliteValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ToSql for SqliteValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqliteValue::Null => ToSqlOutput::Owned(Value::Null),
            SqliteValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqliteValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqliteValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqliteValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl SqliteValue {
    /// Encode a date in the ISO form SQLite's date functions understand.
    pub fn from_date(date: NaiveDate) -> Self {
        SqliteValue::Text(date.format("%Y-%m-%d").to_string())
    }

    /// Encode a datetime; fractional seconds appear only when non-zero.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        SqliteValue::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }

    /// Encode a time of day.
    pub fn from_time(time: NaiveTime) -> Self {
        SqliteValue::Text(time.format("%H:%M:%S%.f").to_string())
    }

    /// Encode an unsigned 64-bit value. SQLite INTEGER is a signed 64-bit
    /// class, so values past `i64::MAX` keep their exact digits as TEXT.
    pub fn from_u64(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => SqliteValue::Integer(v),
            Err(_) => SqliteValue::Text(v.to_string()),
        }
    }

    /// Encode a BIT(n) bit string.
    ///
    /// Up to 8 bits the value is a small integer; wider bit strings stay a
    /// byte blob of the declared width.
    pub fn from_bits(v: u64, bits: u32) -> Self {
        if bits <= 8 {
            SqliteValue::Integer(v as i64)
        } else {
            let width = bits.div_ceil(8) as usize;
            let bytes = v.to_be_bytes();
            SqliteValue::Blob(bytes[bytes.len() - width..].to_vec())
        }
    }
}

/// Per-column decode plan, derived from the parsed source type once per
/// table and consulted for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    SignedInt,
    UnsignedInt,
    /// `TINYINT(1)` boolean convention; surfaces as 0/1.
    Bool,
    Float,
    Double,
    /// Exact digits preserved as TEXT.
    Decimal,
    Text,
    Blob,
    /// `BIT(n)`, integer when n ≤ 8, blob otherwise.
    Bit { bits: u32 },
    Date,
    DateTime,
    Time,
    Json,
    Year,
}

impl FieldKind {
    /// Derive the decode plan for one column.
    pub fn from_source(ty: &SourceType) -> FieldKind {
        match ty {
            SourceType::TinyInt { .. } if ty.is_boolean() => FieldKind::Bool,
            SourceType::TinyInt { unsigned, .. }
            | SourceType::SmallInt { unsigned }
            | SourceType::MediumInt { unsigned }
            | SourceType::Int { unsigned }
            | SourceType::BigInt { unsigned } => {
                if *unsigned {
                    FieldKind::UnsignedInt
                } else {
                    FieldKind::SignedInt
                }
            }
            SourceType::Year => FieldKind::Year,
            SourceType::Bit { bits } => FieldKind::Bit { bits: *bits },
            SourceType::Float => FieldKind::Float,
            SourceType::Double => FieldKind::Double,
            SourceType::Decimal { .. } => FieldKind::Decimal,
            SourceType::Char { .. }
            | SourceType::VarChar { .. }
            | SourceType::TinyText
            | SourceType::Text
            | SourceType::MediumText
            | SourceType::LongText
            | SourceType::Enum { .. }
            | SourceType::Set { .. } => FieldKind::Text,
            SourceType::Date => FieldKind::Date,
            SourceType::DateTime { .. } | SourceType::Timestamp { .. } => FieldKind::DateTime,
            SourceType::Time { .. } => FieldKind::Time,
            SourceType::Binary { .. }
            | SourceType::VarBinary { .. }
            | SourceType::TinyBlob
            | SourceType::Blob
            | SourceType::MediumBlob
            | SourceType::LongBlob
            | SourceType::Spatial { .. } => FieldKind::Blob,
            SourceType::Json => FieldKind::Json,
        }
    }
}

/// Dedicated error kind for value decoding and temporal readback.
#[derive(Debug, Error)]
pub enum ValueDecodeError {
    /// A wire value could not be decoded into the planned storage class.
    #[error("column index {index}: {message}")]
    Decode { index: usize, message: String },

    /// A stored date/time string did not parse under any accepted format.
    #[error("malformed date/time value {value:?}")]
    MalformedTemporal { value: String },
}

/// Parse a stored DATE value: ISO-8601 first, then permissive fallbacks.
pub fn parse_date_lenient(value: &str) -> Result<NaiveDate, ValueDecodeError> {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(ValueDecodeError::MalformedTemporal {
        value: value.to_string(),
    })
}

/// Parse a stored DATETIME value: ISO-8601 with space or `T` separator and
/// optional fractional seconds, then a bare-date fallback at midnight.
pub fn parse_datetime_lenient(value: &str) -> Result<NaiveDateTime, ValueDecodeError> {
    let trimmed = value.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = parse_date_lenient(trimmed) {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(ValueDecodeError::MalformedTemporal {
        value: value.to_string(),
    })
}

/// Parse a stored TIME value into a signed duration.
///
/// Accepts `[-][H]H:MM:SS` with optional fractional seconds; hours may
/// exceed 23 (MySQL TIME spans −838 to 838 hours).
pub fn parse_time_lenient(value: &str) -> Result<Duration, ValueDecodeError> {
    let trimmed = value.trim();
    let malformed = || ValueDecodeError::MalformedTemporal {
        value: value.to_string(),
    };

    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut parts = rest.split(':');
    let hours: i64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
    let minutes: i64 = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
    let seconds_part = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() || minutes >= 60 {
        return Err(malformed());
    }

    let (whole, micros) = match seconds_part.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 6 || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed());
            }
            let scaled: i64 =
                frac.parse::<i64>().map_err(|_| malformed())? * 10_i64.pow(6 - frac.len() as u32);
            (whole, scaled)
        }
        None => (seconds_part, 0),
    };
    let seconds: i64 = whole.parse().map_err(|_| malformed())?;
    if seconds >= 60 {
        return Err(malformed());
    }

    let total = Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::microseconds(micros);
    Ok(if negative { -total } else { total })
}

/// Render a [`NaiveTime`] the way [`parse_time_lenient`] reads it back.
pub fn format_time(time: NaiveTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        time.format("%H:%M:%S%.f").to_string()
    }
}
