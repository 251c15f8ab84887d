//! Suffcal entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use suffcal::cli::Cli;
use suffcal::commands;

#[tokio::main]
async fn main() {
    // Load .env.local or .env if present
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = commands::execute(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
