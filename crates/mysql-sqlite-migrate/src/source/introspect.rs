//! Schema introspection against the MySQL information schema.
//!
//! Catalog queries, not `SHOW` commands: `information_schema` gives
//! canonical, stable column ordering via `ORDINAL_POSITION` and exposes the
//! full declared `COLUMN_TYPE`. String columns are CAST to CHAR because
//! some server collation setups return them as VARBINARY.

use std::collections::HashMap;

use sqlx::mysql::MySqlRow;
use sqlx::Row;
use tracing::{debug, warn};

use super::MysqlSource;
use crate::config::TransferOptions;
use crate::core::schema::{
    ColumnDescriptor, FkAction, ForeignKeyDescriptor, IndexColumn, IndexDescriptor, IndexKind,
    TableDescriptor, TableKind,
};
use crate::error::Result;

impl MysqlSource {
    /// List the tables (and, when requested, views) the plan covers, in
    /// stable name order.
    pub async fn list_tables(&self, options: &TransferOptions) -> Result<Vec<(String, TableKind)>> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
                CAST(TABLE_TYPE AS CHAR(32)) AS TABLE_TYPE
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME
            "#,
        )
        .bind(self.database())
        .fetch_all(self.pool())
        .await?;

        let mut tables = Vec::new();
        for row in rows {
            let name: String = row.get("TABLE_NAME");
            let table_type: String = row.get("TABLE_TYPE");
            let kind = if table_type.eq_ignore_ascii_case("VIEW") {
                TableKind::View
            } else {
                TableKind::BaseTable
            };

            if kind == TableKind::View && !options.views_as_tables {
                debug!("skipping view {:?}", name);
                continue;
            }
            if !options.tables.is_empty() && !options.tables.contains(&name) {
                continue;
            }
            if options.exclude_tables.contains(&name) {
                continue;
            }

            tables.push((name, kind));
        }

        if !options.tables.is_empty() {
            for requested in &options.tables {
                if !tables.iter().any(|(name, _)| name == requested) {
                    warn!("requested table {:?} does not exist in the source", requested);
                }
            }
        }

        Ok(tables)
    }

    /// Build the full descriptor for one table.
    pub async fn describe_table(&self, name: &str, kind: TableKind) -> Result<TableDescriptor> {
        let columns = self.load_columns(name).await?;
        let primary_key = self.load_primary_key(name).await?;
        let indices = self.load_indices(name).await?;
        let foreign_keys = self.load_foreign_keys(name).await?;

        Ok(TableDescriptor {
            name: name.to_string(),
            kind,
            columns,
            primary_key,
            indices,
            foreign_keys,
        })
    }

    async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(COLUMN_TYPE AS CHAR(255)) AS COLUMN_TYPE,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(COLUMN_DEFAULT AS CHAR(4096)) AS COLUMN_DEFAULT,
                CAST(EXTRA AS CHAR(255)) AS EXTRA,
                CAST(CHARACTER_SET_NAME AS CHAR(64)) AS CHARACTER_SET_NAME,
                CAST(COLLATION_NAME AS CHAR(64)) AS COLLATION_NAME
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(self.database())
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        let columns = rows
            .iter()
            .map(|row| {
                let extra: String = row
                    .try_get::<Option<String>, _>("EXTRA")
                    .unwrap_or(None)
                    .unwrap_or_default();
                let extra_lower = extra.to_lowercase();
                ColumnDescriptor {
                    name: row.get("COLUMN_NAME"),
                    declared_type: row.get("COLUMN_TYPE"),
                    nullable: row.get::<i32, _>("is_nullable") == 1,
                    default: row.try_get::<Option<String>, _>("COLUMN_DEFAULT").unwrap_or(None),
                    auto_increment: extra_lower.contains("auto_increment"),
                    has_on_update: extra_lower.contains("on update"),
                    default_generated: extra_lower.contains("generated"),
                    charset: row
                        .try_get::<Option<String>, _>("CHARACTER_SET_NAME")
                        .unwrap_or(None),
                    collation: row
                        .try_get::<Option<String>, _>("COLLATION_NAME")
                        .unwrap_or(None),
                }
            })
            .collect();

        Ok(columns)
    }

    async fn load_primary_key(&self, table: &str) -> Result<Vec<String>> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(self.database())
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(|row| row.get("COLUMN_NAME")).collect())
    }

    async fn load_indices(&self, table: &str) -> Result<Vec<IndexDescriptor>> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(INDEX_NAME AS CHAR(255)) AS INDEX_NAME,
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                SUB_PART,
                NON_UNIQUE,
                CAST(INDEX_TYPE AS CHAR(32)) AS INDEX_TYPE
            FROM INFORMATION_SCHEMA.STATISTICS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY'
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
            "#,
        )
        .bind(self.database())
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        // group by index name, preserving first-seen order
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, IndexDescriptor> = HashMap::new();

        for row in rows {
            let name: String = row.get("INDEX_NAME");
            let column: String = row.get("COLUMN_NAME");
            let sub_part: Option<i64> = row.try_get("SUB_PART").unwrap_or(None);
            let non_unique: i64 = row.try_get("NON_UNIQUE").unwrap_or(1);
            let index_type: String = row.try_get("INDEX_TYPE").unwrap_or_default();

            let kind = match index_type.to_uppercase().as_str() {
                "FULLTEXT" => IndexKind::FullText,
                "SPATIAL" => IndexKind::Spatial,
                _ if non_unique == 0 => IndexKind::Unique,
                _ => IndexKind::NonUnique,
            };

            let entry = grouped.entry(name.clone()).or_insert_with(|| {
                order.push(name.clone());
                IndexDescriptor {
                    name,
                    columns: Vec::new(),
                    kind,
                }
            });
            entry.columns.push(IndexColumn {
                name: column,
                prefix_len: sub_part.and_then(|p| u32::try_from(p).ok()),
            });
        }

        debug!("loaded {} indices for {}", order.len(), table);
        Ok(order
            .into_iter()
            .filter_map(|name| grouped.remove(&name))
            .collect())
    }

    async fn load_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
            SELECT
                CAST(k.CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
                CAST(k.COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(k.REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
                CAST(k.REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME,
                CAST(c.UPDATE_RULE AS CHAR(32)) AS UPDATE_RULE,
                CAST(c.DELETE_RULE AS CHAR(32)) AS DELETE_RULE
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS k
            JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS AS c
                ON c.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
                AND c.CONSTRAINT_NAME = k.CONSTRAINT_NAME
                AND c.TABLE_NAME = k.TABLE_NAME
            WHERE k.TABLE_SCHEMA = ?
              AND k.TABLE_NAME = ?
              AND k.REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION
            "#,
        )
        .bind(self.database())
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, ForeignKeyDescriptor> = HashMap::new();

        for row in rows {
            let name: String = row.get("CONSTRAINT_NAME");
            let column: String = row.get("COLUMN_NAME");
            let ref_table: String = row.get("REFERENCED_TABLE_NAME");
            let ref_column: String = row.get("REFERENCED_COLUMN_NAME");
            let on_update: String = row.try_get("UPDATE_RULE").unwrap_or_default();
            let on_delete: String = row.try_get("DELETE_RULE").unwrap_or_default();

            let entry = grouped.entry(name.clone()).or_insert_with(|| {
                order.push(name.clone());
                ForeignKeyDescriptor {
                    name,
                    columns: Vec::new(),
                    ref_table,
                    ref_columns: Vec::new(),
                    on_update: FkAction::parse(&on_update),
                    on_delete: FkAction::parse(&on_delete),
                }
            });
            entry.columns.push(column);
            entry.ref_columns.push(ref_column);
        }

        debug!("loaded {} foreign keys for {}", order.len(), table);
        Ok(order
            .into_iter()
            .filter_map(|name| grouped.remove(&name))
            .collect())
    }
}
