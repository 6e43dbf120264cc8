//! Prompt construction for the two LLM round trips.
//!
//! The first prompt turns a question into SQL with the schema as context;
//! the second turns the executed result set back into a plain-language
//! answer.

use crate::db::{QueryResult, Schema};
use crate::llm::types::Message;

/// System prompt template for SQL generation.
const SQL_PROMPT_TEMPLATE: &str = r#"You are a SQL assistant for a SQLite database. Generate SQL queries based on user questions.

DATABASE SCHEMA:
{schema}

INSTRUCTIONS:
- Generate only valid SQLite SQL
- Generate a single read-only SELECT query; never modify data
- Use appropriate JOINs based on foreign keys
- If the question cannot be answered with the schema, say so instead of guessing

OUTPUT FORMAT:
Return the SQL query wrapped in ```sql code blocks.
If you need to explain something, put it before or after the code block."#;

/// User prompt template for answer synthesis.
const SYNTHESIS_PROMPT_TEMPLATE: &str = r#"Question: {question}

SQL executed:
{sql}

Query result:
{result}

Answer the question in plain language using only the query result above. If the result does not answer the question, say so."#;

/// System prompt for the synthesis round trip.
const SYNTHESIS_SYSTEM_PROMPT: &str =
    "You answer questions about a SQLite database from query results. Be concise and factual.";

/// Maximum result rows rendered into the synthesis prompt.
const SYNTHESIS_ROW_CAP: usize = 50;

/// Builds the SQL-generation system prompt with the schema injected.
pub fn build_sql_prompt(schema: &Schema) -> String {
    SQL_PROMPT_TEMPLATE.replace("{schema}", &schema.format_for_llm())
}

/// Builds the message list for the SQL-generation round trip.
pub fn build_sql_messages(system_prompt: &str, question: &str) -> Vec<Message> {
    vec![Message::system(system_prompt), Message::user(question)]
}

/// Builds the message list for the answer-synthesis round trip.
pub fn build_synthesis_messages(question: &str, sql: &str, result: &QueryResult) -> Vec<Message> {
    let prompt = SYNTHESIS_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{sql}", sql)
        .replace("{result}", &format_result_context(result));

    vec![Message::system(SYNTHESIS_SYSTEM_PROMPT), Message::user(prompt)]
}

/// Renders a result set as pipe-separated text for the synthesis prompt,
/// capped so a huge result cannot blow up the request.
pub fn format_result_context(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "(no rows)".to_string();
    }

    let mut lines = Vec::with_capacity(result.rows.len().min(SYNTHESIS_ROW_CAP) + 2);
    lines.push(
        result
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
    );

    for row in result.rows.iter().take(SYNTHESIS_ROW_CAP) {
        lines.push(
            row.iter()
                .map(|v| v.to_display_string())
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }

    if result.rows.len() > SYNTHESIS_ROW_CAP {
        lines.push(format!(
            "(and {} more rows)",
            result.rows.len() - SYNTHESIS_ROW_CAP
        ));
    }

    lines.join("\n")
}
