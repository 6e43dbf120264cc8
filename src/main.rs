//! db-sage - Ask questions about a SQLite database in plain language.

use db_sage::app;
use db_sage::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Pick up OPENAI_API_KEY and friends from a local .env file.
    dotenvy::dotenv().ok();

    // Logs go to stderr so preview output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    if let Err(e) = app::run(cli).await {
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}
