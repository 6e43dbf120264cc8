//! Schema preview for db-sage.
//!
//! Lists every table with its column headers and a handful of sample rows.
//! Tables appear in catalog order and columns in declaration order; sample
//! rows come back in whatever order the storage engine returns them.

use crate::db::{DatabaseClient, SqliteClient, Value};
use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Maximum number of sample rows shown per table.
pub const PREVIEW_ROW_LIMIT: usize = 5;

/// A table's name, column headers, and sample rows.
#[derive(Debug, Clone)]
pub struct TablePreview {
    /// Table name.
    pub name: String,

    /// Column names in declaration order.
    pub columns: Vec<String>,

    /// Up to [`PREVIEW_ROW_LIMIT`] sample rows.
    pub rows: Vec<Vec<Value>>,
}

impl TablePreview {
    /// Ordered column-name/value pairs for the row at `index`.
    pub fn row_entries(&self, index: usize) -> Vec<(&str, &Value)> {
        self.rows
            .get(index)
            .map(|row| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Renders the preview as an aligned plain-text table.
    pub fn format_text(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Value::to_display_string).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(String::len).collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.len());
                }
            }
        }

        let format_row = |cells: Vec<String>| -> String {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<1$}", cell, widths.get(i).copied().unwrap_or(0)))
                .collect();
            format!("  {}", padded.join(" | ").trim_end())
        };

        let mut lines = vec![format!("Table: {}", self.name)];
        lines.push(format_row(self.columns.clone()));
        lines.push(format!(
            "  {}",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-")
        ));
        for row in rendered {
            lines.push(format_row(row));
        }
        if self.rows.is_empty() {
            lines.push("  (no rows)".to_string());
        }

        lines.join("\n")
    }
}

/// Previews every table in the database file.
///
/// Opens its own read-only connection and closes it before returning.
pub async fn preview_file(path: &Path) -> Result<Vec<TablePreview>> {
    let client = SqliteClient::open(path).await?;
    let previews = preview_with(&client).await;
    client.close().await;
    previews
}

/// Previews every table through an already opened client.
///
/// Column headers come from introspection rather than the sample query, so
/// empty tables still show their columns in declaration order. Any read
/// error aborts the whole preview; partial previews are never returned.
pub async fn preview_with(client: &(impl DatabaseClient + ?Sized)) -> Result<Vec<TablePreview>> {
    let schema = client.introspect_schema().await?;
    let mut previews = Vec::with_capacity(schema.tables.len());

    for table in &schema.tables {
        let sql = format!(
            "SELECT * FROM \"{}\" LIMIT {}",
            table.name.replace('"', "\"\""),
            PREVIEW_ROW_LIMIT
        );
        let result = client.execute_query(&sql).await?;

        debug!(table = %table.name, rows = result.row_count, "previewed table");
        previews.push(TablePreview {
            name: table.name.clone(),
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            rows: result.rows,
        });
    }

    Ok(previews)
}
