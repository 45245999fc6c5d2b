mod accounts;
mod api;
mod auth;
mod cli;
mod router;
mod session;
mod startup;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn load_config() -> pharmatrack_core::Config {
    pharmatrack_core::config::load_dotenv();
    pharmatrack_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = cli::Cli::parse();
    let config = load_config();
    config.log_summary();

    cli::dispatch(&config, cli.command).await
}
