//! CLI argument parsing and subcommand dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use pharmatrack_core::{Config, NewAccount};

use crate::accounts::create_account;
use crate::startup;

/// Pharmaceutical inventory tracker with expiration alerts.
#[derive(Parser, Debug)]
#[command(name = "pharmatrack-server", version, about = "Pharmaceutical inventory tracker with expiration alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API and the alert scheduler (default)
    Serve,

    /// Run one alert tick now and print the report as JSON
    CheckAlerts,

    /// Create an account
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long, env = "PHARMA_NEW_USER_PASSWORD")]
        password: String,

        #[arg(long)]
        email: String,

        /// admin, pharmacist or manufacturer
        #[arg(long, default_value = "pharmacist")]
        role: String,
    },
}

/// Run the selected subcommand. No subcommand means `serve`.
pub async fn dispatch(config: &Config, command: Option<Command>) -> anyhow::Result<()> {
    match command.unwrap_or(Command::Serve) {
        Command::Serve => startup::serve(config).await,
        Command::CheckAlerts => check_alerts(config).await,
        Command::CreateUser {
            username,
            password,
            email,
            role,
        } => {
            let req = NewAccount {
                username,
                password,
                email,
                role,
            };
            create_user(config, req).await
        }
    }
}

async fn check_alerts(config: &Config) -> anyhow::Result<()> {
    let state = startup::build_app_state(config).await?;
    let report = state.scheduler.tick(Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn create_user(config: &Config, req: NewAccount) -> anyhow::Result<()> {
    let repo = pharmatrack_storage::open_repository(config).await?;
    if repo.backend_name() == "memory" {
        tracing::warn!("PostgreSQL not configured, the account will not outlive this process");
    }
    let account = create_account(repo.as_ref(), req).await?;
    info!(user_id = account.id, role = %account.role, "account created");
    println!("{}", serde_json::to_string_pretty(&account)?);
    Ok(())
}
