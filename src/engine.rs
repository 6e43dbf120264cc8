//! Natural-language query engine.
//!
//! Wraps one read-only database and one LLM client. Each question makes
//! two LLM round trips: one to generate SQL from the schema, one to phrase
//! the executed result as an answer. Construction errors are terminal;
//! per-question errors leave the engine usable.

use crate::db::{DatabaseClient, Schema, SqliteClient};
use crate::error::Result;
use crate::llm::{self, extract_sql, prompt, LlmClient, LlmSettings};
use crate::preview::{self, TablePreview};
use crate::safety;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Display placeholder when the engine produced no SQL.
pub const SQL_PLACEHOLDER: &str = "SQL not found";

/// An answer paired with the SQL that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    /// Natural-language answer text.
    pub answer: String,

    /// The SQL statement, or `None` when no SQL was produced.
    pub sql: Option<String>,
}

impl QueryAnswer {
    /// SQL for display, with the fixed placeholder when absent.
    pub fn sql_display(&self) -> &str {
        self.sql.as_deref().unwrap_or(SQL_PLACEHOLDER)
    }
}

/// Query engine over one database file and one LLM client.
pub struct QueryEngine {
    db: Box<dyn DatabaseClient>,
    llm: Box<dyn LlmClient>,
    schema: Schema,
    sql_prompt: String,
}

impl QueryEngine {
    /// Opens the database read-only and builds the LLM client from
    /// explicit settings.
    ///
    /// The schema is introspected once here; a missing or malformed
    /// database file fails construction, and there is no degraded mode.
    pub async fn open(path: &Path, settings: &LlmSettings) -> Result<Self> {
        let db = SqliteClient::open(path).await?;
        let llm = llm::create_client(settings)?;
        Self::from_clients(Box::new(db), llm).await
    }

    /// Builds an engine from already constructed clients.
    pub async fn from_clients(
        db: Box<dyn DatabaseClient>,
        llm: Box<dyn LlmClient>,
    ) -> Result<Self> {
        let schema = db.introspect_schema().await?;
        let sql_prompt = prompt::build_sql_prompt(&schema);

        info!(tables = schema.tables.len(), "query engine ready");
        Ok(Self {
            db,
            llm,
            schema,
            sql_prompt,
        })
    }

    /// The schema introspected at construction.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Previews every table through the engine's own connection.
    pub async fn preview(&self) -> Result<Vec<TablePreview>> {
        preview::preview_with(self.db.as_ref()).await
    }

    /// Answers one question about the database.
    ///
    /// Returns an error for this question only; the engine stays usable for
    /// the next one. When the model produces no SQL, its prose becomes the
    /// answer and the SQL slot stays empty.
    pub async fn ask(&self, question: &str) -> Result<QueryAnswer> {
        let start = Instant::now();

        let messages = prompt::build_sql_messages(&self.sql_prompt, question);
        let response = self.llm.complete(&messages).await?;

        let extracted = extract_sql(&response);
        let Some(sql) = extracted.sql else {
            debug!("no SQL in model response");
            let answer = if extracted.text.is_empty() {
                "The model did not produce an answer.".to_string()
            } else {
                extracted.text
            };
            return Ok(QueryAnswer { answer, sql: None });
        };

        safety::ensure_read_only(&sql)?;

        let result = self.db.execute_query(&sql).await?;
        debug!(sql = %sql, rows = result.row_count, "generated query executed");

        let messages = prompt::build_synthesis_messages(question, &sql, &result);
        let mut answer = self.llm.complete(&messages).await?.trim().to_string();
        if answer.is_empty() {
            // Degenerate synthesis reply; show the raw rows instead.
            answer = prompt::format_result_context(&result);
        }

        if let Some(warning) = result.truncation_warning() {
            answer.push('\n');
            answer.push_str(&warning);
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "question answered"
        );
        Ok(QueryAnswer {
            answer,
            sql: Some(sql),
        })
    }

    /// Closes the underlying database connection.
    pub async fn close(&self) {
        self.db.close().await;
    }
}
