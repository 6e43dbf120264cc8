//! Query engine integration tests.
//!
//! Runs the full question flow against real SQLite files, with the LLM
//! side mocked: generate SQL, validate it, execute it, phrase the answer.

use db_sage::app::{handle_session_line, SessionReply};
use db_sage::db::SqliteClient;
use db_sage::engine::{QueryEngine, SQL_PLACEHOLDER};
use db_sage::llm::{LlmSettings, MockLlmClient};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::sync::Arc;
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

async fn employee_db(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("employees.db");
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
    path
}

/// Opens the employee database with a canned LLM and keeps a handle on the
/// mock so the test can inspect its requests.
async fn employee_engine(path: &Path, llm: Arc<MockLlmClient>) -> QueryEngine {
    let db = SqliteClient::open(path).await.unwrap();
    QueryEngine::from_clients(Box::new(db), Box::new(llm))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_highest_paid_employee_end_to_end() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(
        MockLlmClient::new()
            .with_response(
                "highest paid",
                "```sql\nSELECT name, salary FROM employees ORDER BY salary DESC LIMIT 1;\n```",
            )
            .with_answer("Bob is the highest paid employee, earning 120000."),
    );
    let engine = employee_engine(&path, llm.clone()).await;

    let answer = engine
        .ask("who is the highest paid employee?")
        .await
        .unwrap();
    engine.close().await;

    assert!(!answer.answer.is_empty());
    assert!(answer.answer.contains("Bob"));

    let sql = answer.sql.as_deref().unwrap();
    assert!(sql.contains("employees"));

    // The executed rows flow back into the synthesis request.
    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].contains("Bob"));
    assert!(requests[1].contains("120000"));
}

#[tokio::test]
async fn test_schema_reaches_the_generation_prompt() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(MockLlmClient::new());
    let engine = employee_engine(&path, llm.clone()).await;

    let _ = engine.ask("anything at all").await.unwrap();
    engine.close().await;

    // The mock records the user message; the schema rides in up front.
    assert_eq!(engine.schema().table_names(), vec!["employees"]);
    let prompt = db_sage::llm::prompt::build_sql_prompt(engine.schema());
    assert!(prompt.contains("Table: employees"));
    assert!(prompt.contains("salary"));
}

#[tokio::test]
async fn test_refusal_keeps_placeholder_and_database_untouched() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(MockLlmClient::new());
    let engine = employee_engine(&path, llm.clone()).await;

    let answer = engine.ask("what is the weather like?").await.unwrap();
    engine.close().await;

    assert_eq!(answer.sql, None);
    assert_eq!(answer.sql_display(), SQL_PLACEHOLDER);
    assert!(!answer.answer.is_empty());

    // Only the generation round trip happened.
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_generated_write_rejected_then_engine_recovers() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(
        MockLlmClient::new()
            .with_response("delete", "```sql\nDELETE FROM employees;\n```")
            .with_response(
                "count",
                "```sql\nSELECT COUNT(*) AS n FROM employees;\n```",
            )
            .with_answer("There are 3 employees."),
    );
    let engine = employee_engine(&path, llm.clone()).await;

    let err = engine.ask("delete everyone").await.err().unwrap();
    assert!(err.to_string().contains("non-read-only"));

    // The table is intact and the engine still answers.
    let answer = engine.ask("count the employees").await.unwrap();
    engine.close().await;

    assert!(answer.answer.contains("3"));
    let requests = llm.requests();
    assert!(requests.last().unwrap().contains("Query result:\nn\n3"));
}

#[tokio::test]
async fn test_bad_generated_sql_fails_only_that_question() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(
        MockLlmClient::new()
            .with_response("typo", "```sql\nSELECT wages FROM employees;\n```")
            .with_response("names", "```sql\nSELECT name FROM employees;\n```")
            .with_answer("Alice, Bob, and Carol."),
    );
    let engine = employee_engine(&path, llm.clone()).await;

    let err = engine.ask("typo question").await.err().unwrap();
    assert_eq!(err.category(), "Database Error");

    let answer = engine.ask("list the names").await.unwrap();
    engine.close().await;

    assert!(answer.answer.contains("Alice"));
}

#[tokio::test]
async fn test_open_with_mock_provider_needs_no_api_key() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let engine = QueryEngine::open(&path, &LlmSettings::mock()).await.unwrap();
    let answer = engine.ask("who works here?").await.unwrap();
    engine.close().await;

    // The stock mock declines to produce SQL.
    assert_eq!(answer.sql_display(), SQL_PLACEHOLDER);
}

#[tokio::test]
async fn test_session_schema_command_on_real_database() {
    let dir = tempdir().unwrap();
    let path = employee_db(dir.path()).await;

    let llm = Arc::new(MockLlmClient::new());
    let engine = employee_engine(&path, llm).await;

    let reply = handle_session_line(&engine, "/schema").await.unwrap();
    engine.close().await;

    match reply {
        SessionReply::Text(text) => {
            assert!(text.contains("Table: employees"));
            assert!(text.contains("salary"));
            assert!(text.contains("Alice"));
        }
        other => panic!("expected text, got {other:?}"),
    }
}
