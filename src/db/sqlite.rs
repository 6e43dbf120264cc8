//! SQLite database client implementation.
//!
//! Opens the database file read-only; all mutation is rejected at the
//! connection level regardless of what SQL reaches it.

use crate::db::schema::{Column, ForeignKey, Schema, Table};
use crate::db::types::{ColumnInfo, QueryResult, Row, Value};
use crate::db::DatabaseClient;
use crate::error::{Result, SageError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Row as _, TypeInfo, ValueRef};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Timeout for opening the database in seconds.
const OPEN_TIMEOUT_SECS: u64 = 5;

/// Timeout for individual queries in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum number of rows a query may return before truncation.
const MAX_ROWS: usize = 1000;

/// SQLite implementation of the database client.
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens a SQLite database file read-only.
    ///
    /// Fails when the file does not exist. A file that exists but is not a
    /// SQLite database may not fail until the first query touches a page.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(OPEN_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| {
                SageError::database(format!("Failed to open {}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), "opened SQLite database read-only");
        Ok(Self { pool })
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        // No ORDER BY: catalog order is the contract.
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SageError::database(format!("Failed to list tables: {}", e)))?;

        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    async fn introspect_table(&self, name: &str) -> Result<Table> {
        let rows: Vec<(i64, String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT cid, name, type, "notnull", CAST(dflt_value AS TEXT), pk
               FROM pragma_table_info(?1)
               ORDER BY cid"#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SageError::database(format!("Failed to read columns of table '{}': {}", name, e))
        })?;

        let mut table = Table::new(name);
        let mut pk_columns: Vec<(i64, String)> = Vec::new();

        for (_cid, col_name, col_type, not_null, default, pk_ordinal) in rows {
            // Untyped columns show up with an empty type string.
            let data_type = if col_type.is_empty() {
                "ANY".to_string()
            } else {
                col_type
            };

            let mut column = Column::new(&col_name, data_type).nullable(not_null == 0);
            if let Some(default) = default {
                column = column.with_default(default);
            }
            table.columns.push(column);

            if pk_ordinal > 0 {
                pk_columns.push((pk_ordinal, col_name));
            }
        }

        pk_columns.sort_by_key(|(ordinal, _)| *ordinal);
        table.primary_key = pk_columns.into_iter().map(|(_, name)| name).collect();

        Ok(table)
    }

    async fn table_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        // "to" is NULL when the reference is to the parent's implicit PK.
        let rows: Vec<(i64, i64, String, String, Option<String>)> = sqlx::query_as(
            r#"SELECT id, seq, "table", "from", "to"
               FROM pragma_foreign_key_list(?1)
               ORDER BY id, seq"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            SageError::database(format!(
                "Failed to read foreign keys of table '{}': {}",
                table, e
            ))
        })?;

        let mut foreign_keys: Vec<ForeignKey> = Vec::new();
        let mut last_id: Option<i64> = None;

        for (id, _seq, to_table, from_column, to_column) in rows {
            if last_id != Some(id) {
                foreign_keys.push(ForeignKey::new(table, Vec::new(), to_table, Vec::new()));
                last_id = Some(id);
            }
            if let Some(fk) = foreign_keys.last_mut() {
                fk.from_columns.push(from_column);
                fk.to_columns.push(to_column.unwrap_or_default());
            }
        }

        Ok(foreign_keys)
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let names = self.list_table_names().await?;

        let mut tables = Vec::with_capacity(names.len());
        let mut foreign_keys = Vec::new();

        for name in &names {
            tables.push(self.introspect_table(name).await?);
            foreign_keys.extend(self.table_foreign_keys(name).await?);
        }

        debug!(
            tables = tables.len(),
            foreign_keys = foreign_keys.len(),
            "schema introspection complete"
        );

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            SageError::database(format!(
                "Query timed out after {} seconds",
                QUERY_TIMEOUT_SECS
            ))
        })?
        .map_err(|e| SageError::database(format!("Query failed: {}", e)))?;

        let execution_time = start.elapsed();
        let total_rows = rows.len();
        let was_truncated = total_rows > MAX_ROWS;

        let columns: Vec<ColumnInfo> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ColumnInfo::new(c.name(), c.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let data: Vec<Row> = rows
            .iter()
            .take(MAX_ROWS)
            .map(convert_row)
            .collect::<Result<_>>()?;

        debug!(
            rows = data.len(),
            total_rows,
            elapsed_ms = execution_time.as_millis() as u64,
            "query executed"
        );

        Ok(QueryResult {
            columns,
            row_count: data.len(),
            rows: data,
            execution_time,
            total_rows: Some(total_rows),
            was_truncated,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|index| convert_value(row, index))
        .collect()
}

/// Converts a single column value based on its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| SageError::database(format!("Failed to read column {}: {}", index, e)))?;

    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_uppercase();
    let decode_err =
        |e: sqlx::Error| SageError::database(format!("Failed to decode column {}: {}", index, e));

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Int(row.try_get(index).map_err(decode_err)?),
        "REAL" | "NUMERIC" => Value::Real(row.try_get(index).map_err(decode_err)?),
        "BLOB" => Value::Blob(row.try_get(index).map_err(decode_err)?),
        // TEXT plus the date/time names sqlite reports for typed columns.
        _ => Value::Text(row.try_get(index).map_err(decode_err)?),
    };

    Ok(value)
}
