//! db-sage - Ask questions about a SQLite database in plain language.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod llm;
pub mod preview;
pub mod safety;
pub mod source;
