//! Database access layer for db-sage.
//!
//! Provides the [`DatabaseClient`] trait along with the SQLite
//! implementation and a mock for testing.

pub mod mock;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use mock::MockDatabaseClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for database operations.
///
/// Implementations read from an already opened database; opening and
/// closing the underlying file is the implementor's business.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema.
    ///
    /// Tables come back in catalog order and columns in declaration order.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the connection.
    async fn close(&self);
}

#[async_trait]
impl<T: DatabaseClient + ?Sized> DatabaseClient for std::sync::Arc<T> {
    async fn introspect_schema(&self) -> Result<Schema> {
        (**self).introspect_schema().await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        (**self).execute_query(sql).await
    }

    async fn close(&self) {
        (**self).close().await;
    }
}
