//! Command-line argument parsing for db-sage.
//!
//! Uses clap to parse the subcommand and the shared data-source and LLM
//! flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ask questions about a SQLite database in plain language.
#[derive(Parser, Debug)]
#[command(name = "sage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite file to import as the active database
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Directory for imported and downloaded database files
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// LLM provider to use (overrides config)
    #[arg(long, value_name = "PROVIDER", global = true)]
    pub llm: Option<String>,

    /// LLM model to use (overrides config)
    #[arg(long, value_name = "MODEL", global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do with the active database.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show tables, columns, and a few sample rows
    Preview,

    /// Ask a single question and print the answer with its SQL
    Ask {
        /// The question, in plain language
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Interactive question loop (/schema, /quit)
    Session,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}
