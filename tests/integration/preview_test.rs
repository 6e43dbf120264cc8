//! Schema preview integration tests.
//!
//! Runs the previewer against real SQLite files and checks table order,
//! column order, and the sample row cap.

use db_sage::preview::{preview_file, PREVIEW_ROW_LIMIT};
use pretty_assertions::assert_eq;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use tempfile::tempdir;

async fn create_db(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
}

#[tokio::test]
async fn test_tables_in_catalog_order_columns_in_declaration_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shop.db");
    create_db(
        &path,
        &[
            "CREATE TABLE zebras (id INTEGER PRIMARY KEY, stripes INTEGER)",
            "CREATE TABLE apples (id INTEGER PRIMARY KEY, variety TEXT, weight REAL)",
            "INSERT INTO zebras VALUES (1, 30)",
        ],
    )
    .await;

    let previews = preview_file(&path).await.unwrap();

    // Catalog order, not alphabetical.
    let names: Vec<&str> = previews.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["zebras", "apples"]);

    assert_eq!(previews[1].columns, vec!["id", "variety", "weight"]);
}

#[tokio::test]
async fn test_small_table_shows_all_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("small.db");
    create_db(
        &path,
        &[
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, salary REAL)",
            "INSERT INTO employees VALUES
                (1, 'Alice', 100000.0),
                (2, 'Bob', 120000.0),
                (3, 'Carol', 95000.0)",
        ],
    )
    .await;

    let previews = preview_file(&path).await.unwrap();

    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].rows.len(), 3);

    let entries = previews[0].row_entries(0);
    assert_eq!(entries[1].0, "name");
    assert_eq!(entries[1].1.to_display_string(), "Alice");
}

#[tokio::test]
async fn test_large_table_capped_at_row_limit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("large.db");

    let mut statements = vec!["CREATE TABLE numbers (n INTEGER)".to_string()];
    for n in 0..20 {
        statements.push(format!("INSERT INTO numbers VALUES ({n})"));
    }
    let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
    create_db(&path, &refs).await;

    let previews = preview_file(&path).await.unwrap();

    assert_eq!(previews[0].rows.len(), PREVIEW_ROW_LIMIT);
}

#[tokio::test]
async fn test_database_without_tables_yields_empty_preview() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bare.db");
    create_db(&path, &["CREATE TABLE t (x INTEGER)", "DROP TABLE t"]).await;

    let previews = preview_file(&path).await.unwrap();
    assert!(previews.is_empty());
}

#[tokio::test]
async fn test_empty_table_keeps_column_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.db");
    create_db(
        &path,
        &["CREATE TABLE ledger (entry_id INTEGER, amount REAL, memo TEXT)"],
    )
    .await;

    let previews = preview_file(&path).await.unwrap();

    assert_eq!(previews[0].columns, vec!["entry_id", "amount", "memo"]);
    assert!(previews[0].rows.is_empty());
    assert!(previews[0].format_text().contains("(no rows)"));
}

#[tokio::test]
async fn test_format_text_renders_aligned_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fmt.db");
    create_db(
        &path,
        &[
            "CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT)",
            "INSERT INTO pets VALUES (1, 'Rex')",
        ],
    )
    .await;

    let previews = preview_file(&path).await.unwrap();
    let text = previews[0].format_text();

    assert_eq!(
        text,
        "Table: pets\n  id | name\n  ---+-----\n  1  | Rex"
    );
}

#[tokio::test]
async fn test_missing_file_fails_preview() {
    let dir = tempdir().unwrap();
    let err = preview_file(&dir.path().join("absent.db")).await.err().unwrap();

    assert_eq!(err.category(), "Database Error");
}
