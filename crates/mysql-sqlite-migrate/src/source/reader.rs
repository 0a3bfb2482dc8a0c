//! Row reading: decode MySQL wire values into SQLite storage classes and
//! hand them to the destination in bounded batches.
//!
//! Two read modes. The streaming cursor (default) keeps at most one batch of
//! rows in memory; the buffered mode (`--use-buffered-cursors`) pulls the
//! whole resultset client-side first, which can help on servers that drop
//! long-lived streaming reads.

use futures::TryStreamExt;
use sqlx::mysql::MySqlRow;
use sqlx::{Row, ValueRef};

use super::MysqlSource;
use crate::core::identifier::quote_mysql;
use crate::core::value::{FieldKind, SqliteValue, ValueDecodeError};
use crate::error::{Result, TransferError};

impl MysqlSource {
    /// Build the row-pulling SELECT for one table.
    pub fn build_select_sql(
        &self,
        table: &str,
        columns: &[String],
        limit: Option<u64>,
    ) -> Result<String> {
        let cols = columns
            .iter()
            .map(|c| quote_mysql(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", cols, quote_mysql(table)?);
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        Ok(sql)
    }

    /// Pull rows and deliver them in batches of at most `batch_rows`.
    ///
    /// Returns the total row count. Decode failures surface as data errors
    /// carrying the table, column, and row ordinal.
    pub async fn fetch_batches<F>(
        &self,
        table: &str,
        sql: &str,
        columns: &[String],
        kinds: &[FieldKind],
        batch_rows: usize,
        buffered: bool,
        mut on_batch: F,
    ) -> Result<u64>
    where
        F: FnMut(Vec<Vec<SqliteValue>>) -> Result<()>,
    {
        let mut total: u64 = 0;
        let mut batch: Vec<Vec<SqliteValue>> = Vec::with_capacity(batch_rows);

        let deliver =
            |batch: &mut Vec<Vec<SqliteValue>>, total: &mut u64, row: &MySqlRow| -> Result<()> {
                let decoded = decode_row(row, kinds).map_err(|err| match err {
                    ValueDecodeError::Decode { index, message } => TransferError::data(
                        table,
                        columns.get(index).cloned().unwrap_or_default(),
                        *total,
                        message,
                    ),
                    other => TransferError::data(table, "", *total, other.to_string()),
                })?;
                batch.push(decoded);
                *total += 1;
                Ok(())
            };

        if buffered {
            let rows: Vec<MySqlRow> = sqlx::query(sql).fetch_all(self.pool()).await?;
            for row in &rows {
                deliver(&mut batch, &mut total, row)?;
                if batch.len() >= batch_rows {
                    on_batch(std::mem::take(&mut batch))?;
                }
            }
        } else {
            let mut stream = sqlx::query(sql).fetch(self.pool());
            while let Some(row) = stream.try_next().await? {
                deliver(&mut batch, &mut total, &row)?;
                if batch.len() >= batch_rows {
                    on_batch(std::mem::take(&mut batch))?;
                }
            }
        }

        if !batch.is_empty() {
            on_batch(batch)?;
        }

        Ok(total)
    }
}

/// Decode one MySQL row into SQLite storage-class values, following the
/// per-column plan.
pub fn decode_row(
    row: &MySqlRow,
    kinds: &[FieldKind],
) -> std::result::Result<Vec<SqliteValue>, ValueDecodeError> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| decode_value(row, i, *kind))
        .collect()
}

fn decode_value(
    row: &MySqlRow,
    index: usize,
    kind: FieldKind,
) -> std::result::Result<SqliteValue, ValueDecodeError> {
    let is_null = row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true);
    if is_null {
        return Ok(SqliteValue::Null);
    }

    let decode_err = |e: sqlx::Error| ValueDecodeError::Decode {
        index,
        message: e.to_string(),
    };

    let value = match kind {
        FieldKind::SignedInt => {
            SqliteValue::Integer(row.try_get::<i64, _>(index).map_err(decode_err)?)
        }
        // TINYINT(1) may be declared unsigned; take whichever width the
        // driver accepts
        FieldKind::Bool => match row.try_get::<i64, _>(index) {
            Ok(v) => SqliteValue::Integer(v),
            Err(_) => SqliteValue::from_u64(row.try_get::<u64, _>(index).map_err(decode_err)?),
        },
        FieldKind::UnsignedInt => {
            SqliteValue::from_u64(row.try_get::<u64, _>(index).map_err(decode_err)?)
        }
        FieldKind::Year => SqliteValue::Integer(i64::from(
            row.try_get::<u16, _>(index).map_err(decode_err)?,
        )),
        FieldKind::Bit { bits } => {
            // the driver exposes BIT as u64; raw byte strings show up on
            // some MariaDB setups
            let value = match row.try_get::<u64, _>(index) {
                Ok(v) => v,
                Err(_) => {
                    let bytes = row.try_get::<Vec<u8>, _>(index).map_err(decode_err)?;
                    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
                }
            };
            SqliteValue::from_bits(value, bits)
        }
        FieldKind::Float => {
            SqliteValue::Real(f64::from(row.try_get::<f32, _>(index).map_err(decode_err)?))
        }
        FieldKind::Double => SqliteValue::Real(row.try_get::<f64, _>(index).map_err(decode_err)?),
        FieldKind::Decimal => SqliteValue::Text(
            row.try_get::<rust_decimal::Decimal, _>(index)
                .map_err(decode_err)?
                .to_string(),
        ),
        FieldKind::Text => SqliteValue::Text(row.try_get::<String, _>(index).map_err(decode_err)?),
        FieldKind::Blob => SqliteValue::Blob(row.try_get::<Vec<u8>, _>(index).map_err(decode_err)?),
        FieldKind::Date => SqliteValue::from_date(
            row.try_get::<chrono::NaiveDate, _>(index).map_err(decode_err)?,
        ),
        FieldKind::DateTime => SqliteValue::from_datetime(
            row.try_get::<chrono::NaiveDateTime, _>(index)
                .map_err(decode_err)?,
        ),
        FieldKind::Time => SqliteValue::from_time(
            row.try_get::<chrono::NaiveTime, _>(index).map_err(decode_err)?,
        ),
        FieldKind::Json => SqliteValue::Text(
            row.try_get::<serde_json::Value, _>(index)
                .map_err(decode_err)?
                .to_string(),
        ),
    };

    Ok(value)
}
