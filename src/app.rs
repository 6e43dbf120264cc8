//! Command dispatch for db-sage.
//!
//! Resolves the active database file, then runs the requested subcommand:
//! a one-shot schema preview, a one-shot question, or the interactive
//! session loop.

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::engine::{QueryAnswer, QueryEngine};
use crate::error::{Result, SageError};
use crate::llm::LlmSettings;
use crate::preview;
use crate::source::{DataSource, SourceResolver};
use std::io::Write as _;
use std::path::Path;
use tokio::io::AsyncBufReadExt;

/// Help text displayed for the /help command.
const HELP_TEXT: &str = r#"Ask a question in plain language, or use a command:
  /schema          - Show every table with sample rows
  /help            - Show this help message
  /quit, /exit     - Exit the session"#;

/// Result of handling one line of session input.
#[derive(Debug)]
pub enum SessionReply {
    /// Nothing to print (blank input).
    None,
    /// Text to print.
    Text(String),
    /// Session should end.
    Exit,
}

/// Runs the parsed command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_from_file(&cli.config_path())?;
    if let Some(dir) = &cli.data_dir {
        config.source.data_dir = dir.clone();
    }

    let source = match &cli.db {
        Some(path) => {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                SageError::source(format!("Failed to read {}: {}", path.display(), e))
            })?;
            DataSource::Import(bytes)
        }
        None => DataSource::Sample,
    };

    let resolver = SourceResolver::new(config.source.clone());
    let db_path = resolver.resolve(&source).await?;

    match cli.command {
        Command::Preview => run_preview(&db_path).await,
        Command::Ask { question } => {
            let settings =
                LlmSettings::resolve(&config.llm, cli.llm.as_deref(), cli.model.as_deref())?;
            run_ask(&db_path, &settings, &question).await
        }
        Command::Session => {
            let settings =
                LlmSettings::resolve(&config.llm, cli.llm.as_deref(), cli.model.as_deref())?;
            run_session(&db_path, &settings).await
        }
    }
}

/// Prints every table with its columns and sample rows.
async fn run_preview(db_path: &Path) -> Result<()> {
    let previews = preview::preview_file(db_path).await?;
    println!("{}", render_previews(&previews));
    Ok(())
}

/// Answers a single question and prints the answer with its SQL.
async fn run_ask(db_path: &Path, settings: &LlmSettings, question: &str) -> Result<()> {
    let engine = QueryEngine::open(db_path, settings).await?;
    let answer = engine.ask(question).await;
    engine.close().await;

    println!("{}", format_answer(&answer?));
    Ok(())
}

/// Interactive loop: each line is a question, lines starting with `/` are
/// commands. A failed question is reported and the loop continues.
async fn run_session(db_path: &Path, settings: &LlmSettings) -> Result<()> {
    let engine = QueryEngine::open(db_path, settings).await?;

    println!(
        "Loaded {} ({} tables).",
        db_path.display(),
        engine.schema().tables.len()
    );
    println!("Ask a question in plain language. Type /help for commands.");
    println!();

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    loop {
        print!("sage> ");
        std::io::stdout().flush().ok();

        let line = lines
            .next_line()
            .await
            .map_err(|e| SageError::internal(format!("Failed to read input: {}", e)))?;
        let Some(line) = line else {
            break;
        };

        match handle_session_line(&engine, &line).await {
            Ok(SessionReply::None) => {}
            Ok(SessionReply::Text(text)) => println!("{}\n", text),
            Ok(SessionReply::Exit) => break,
            Err(e) => eprintln!("{}: {}\n", e.category(), e),
        }
    }

    engine.close().await;
    Ok(())
}

/// Handles one line of session input.
pub async fn handle_session_line(engine: &QueryEngine, input: &str) -> Result<SessionReply> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(SessionReply::None);
    }

    if input.starts_with('/') {
        return handle_session_command(engine, input).await;
    }

    let answer = engine.ask(input).await?;
    Ok(SessionReply::Text(format_answer(&answer)))
}

/// Handles a session command (input starting with /).
async fn handle_session_command(engine: &QueryEngine, input: &str) -> Result<SessionReply> {
    let command = input
        .split_whitespace()
        .next()
        .unwrap_or(input)
        .to_lowercase();

    match command.as_str() {
        "/schema" => {
            let previews = engine.preview().await?;
            Ok(SessionReply::Text(render_previews(&previews)))
        }
        "/help" => Ok(SessionReply::Text(HELP_TEXT.to_string())),
        "/quit" | "/exit" => Ok(SessionReply::Exit),
        _ => Ok(SessionReply::Text(format!(
            "Unknown command: {}. Type /help for available commands.",
            command
        ))),
    }
}

/// Joins table previews into one printable block.
fn render_previews(previews: &[preview::TablePreview]) -> String {
    if previews.is_empty() {
        return "No tables found in the database.".to_string();
    }

    previews
        .iter()
        .map(preview::TablePreview::format_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders an answer followed by the SQL that produced it.
fn format_answer(answer: &QueryAnswer) -> String {
    format!("{}\n\nSQL: {}", answer.answer, answer.sql_display())
}
