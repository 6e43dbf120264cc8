//! Mock database client for testing.
//!
//! Returns canned results without touching a real database file.

use super::{ColumnInfo, DatabaseClient, QueryResult, Schema, Value};
use crate::error::{Result, SageError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined results.
///
/// Queries are matched against registered SQL fragments; anything else gets
/// a one-row echo result. Executed SQL is recorded for assertions.
pub struct MockDatabaseClient {
    schema: Schema,
    canned: Vec<(String, QueryResult)>,
    failures: Vec<(String, String)>,
    failure: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
            canned: Vec::new(),
            failures: Vec::new(),
            failure: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::new()
        }
    }

    /// Registers a canned result for any query containing `sql_fragment`.
    pub fn with_result(mut self, sql_fragment: impl Into<String>, result: QueryResult) -> Self {
        self.canned.push((sql_fragment.into(), result));
        self
    }

    /// Makes any query containing `sql_fragment` fail with `message`.
    pub fn failing_on(
        mut self,
        sql_fragment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failures.push((sql_fragment.into(), message.into()));
        self
    }

    /// Makes every query fail with the given message.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the SQL of every query executed so far.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(SageError::database(message.clone()));
        }

        for (fragment, message) in &self.failures {
            if sql.contains(fragment.as_str()) {
                return Err(SageError::database(message.clone()));
            }
        }

        for (fragment, result) in &self.canned {
            if sql.contains(fragment.as_str()) {
                return Ok(result.clone());
            }
        }

        let columns = vec![ColumnInfo::new("result", "TEXT")];
        let rows = vec![vec![Value::Text(format!("mock result for: {}", sql))]];
        Ok(QueryResult {
            execution_time: Duration::from_millis(1),
            ..QueryResult::with_data(columns, rows)
        })
    }

    async fn close(&self) {}
}
