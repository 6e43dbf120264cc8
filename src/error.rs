//! Error types for db-sage.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for db-sage operations.
#[derive(Error, Debug)]
pub enum SageError {
    /// Data-acquisition errors (sample download failed, disk write failed, etc.)
    #[error("Data source error: {0}")]
    Source(String),

    /// Database errors (malformed file, introspection or query failure, etc.)
    #[error("Database error: {0}")]
    Database(String),

    /// LLM API errors (missing key, rate limits, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad provider name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SageError {
    /// Creates a data-source error with the given message.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Creates a database error with the given message.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Source(_) => "Data Source Error",
            Self::Database(_) => "Database Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using SageError.
pub type Result<T> = std::result::Result<T, SageError>;
