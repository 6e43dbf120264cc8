//! Data source resolution integration tests.
//!
//! Exercises the resolver against the real filesystem: importing bytes,
//! caching the sample, and opening the resolved file as a database.

use async_trait::async_trait;
use db_sage::config::SourceConfig;
use db_sage::db::{DatabaseClient, SqliteClient, Value};
use db_sage::error::{Result, SageError};
use db_sage::source::{DataSource, SampleFetcher, SourceResolver};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use url::Url;

/// Fetcher that serves a fixed body and counts how often it is called.
struct CountingFetcher {
    body: Vec<u8>,
    calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    fn new(body: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                body,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl SampleFetcher for CountingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Fetcher that always fails, for asserting the cache path never fetches.
struct UnreachableFetcher;

#[async_trait]
impl SampleFetcher for UnreachableFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Vec<u8>> {
        Err(SageError::source("network should not be reached"))
    }
}

fn config_for(dir: &Path) -> SourceConfig {
    SourceConfig {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

/// Builds a real SQLite database file and returns its bytes.
async fn sqlite_db_bytes(statements: &[&str]) -> Vec<u8> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("build.db");

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    std::fs::read(&path).unwrap()
}

#[tokio::test]
async fn test_imported_database_is_usable() {
    let bytes = sqlite_db_bytes(&[
        "CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT)",
        "INSERT INTO pets VALUES (1, 'Rex'), (2, 'Maru')",
    ])
    .await;

    let data_dir = tempdir().unwrap();
    let resolver = SourceResolver::with_fetcher(config_for(data_dir.path()), UnreachableFetcher);

    let path = resolver
        .resolve(&DataSource::Import(bytes))
        .await
        .unwrap();
    assert_eq!(path, data_dir.path().join("uploaded.db"));

    // The persisted file opens and answers queries.
    let client = SqliteClient::open(&path).await.unwrap();
    let result = client
        .execute_query("SELECT name FROM pets")
        .await
        .unwrap();
    client.close().await;

    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[0][0], Value::Text("Rex".to_string()));
}

#[tokio::test]
async fn test_cached_sample_never_touches_network() {
    let bytes = sqlite_db_bytes(&["CREATE TABLE t (x INTEGER)"]).await;

    let data_dir = tempdir().unwrap();
    std::fs::write(data_dir.path().join("sample_employee.db"), &bytes).unwrap();

    let resolver = SourceResolver::with_fetcher(config_for(data_dir.path()), UnreachableFetcher);
    let path = resolver.resolve(&DataSource::Sample).await.unwrap();

    assert_eq!(path, data_dir.path().join("sample_employee.db"));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}

#[tokio::test]
async fn test_missing_sample_downloaded_once_then_cached() {
    let bytes = sqlite_db_bytes(&[
        "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT)",
        "INSERT INTO employees VALUES (1, 'Alice')",
    ])
    .await;

    let data_dir = tempdir().unwrap();
    let (fetcher, calls) = CountingFetcher::new(bytes);
    let resolver = SourceResolver::with_fetcher(config_for(data_dir.path()), fetcher);

    let first = resolver.resolve(&DataSource::Sample).await.unwrap();
    let second = resolver.resolve(&DataSource::Sample).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The downloaded sample is a working database.
    let client = SqliteClient::open(&first).await.unwrap();
    let result = client
        .execute_query("SELECT COUNT(*) FROM employees")
        .await
        .unwrap();
    client.close().await;

    assert_eq!(result.rows[0][0], Value::Int(1));
}

#[tokio::test]
async fn test_import_replaces_previous_import() {
    let first = sqlite_db_bytes(&["CREATE TABLE a (x INTEGER)"]).await;
    let second = sqlite_db_bytes(&["CREATE TABLE b (y TEXT)"]).await;

    let data_dir = tempdir().unwrap();
    let resolver = SourceResolver::with_fetcher(config_for(data_dir.path()), UnreachableFetcher);

    resolver.resolve(&DataSource::Import(first)).await.unwrap();
    let path = resolver
        .resolve(&DataSource::Import(second))
        .await
        .unwrap();

    let client = SqliteClient::open(&path).await.unwrap();
    let schema = client.introspect_schema().await.unwrap();
    client.close().await;

    assert_eq!(schema.table_names(), vec!["b"]);
}

#[tokio::test]
async fn test_failed_download_leaves_no_partial_file() {
    let data_dir = tempdir().unwrap();
    let resolver = SourceResolver::with_fetcher(config_for(data_dir.path()), UnreachableFetcher);

    let err = resolver.resolve(&DataSource::Sample).await.err().unwrap();
    assert_eq!(err.category(), "Data Source Error");

    let leftovers: Vec<_> = std::fs::read_dir(data_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}
