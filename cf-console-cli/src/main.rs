//! `cfc` entry point
//!
//! Builds the application state from the config file and the encrypted
//! credential database, then runs one command. Results go to stdout as JSON;
//! logs go to stderr.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cf_console_app::adapters::SqliteStore;
use cf_console_app::{AppConfig, AppState, AppStateBuilder};

use commands::{AccountCommand, PagesCommand, ResourceArgs};

#[derive(Parser)]
#[command(
    name = "cfc",
    version,
    about = "Multi-account Cloudflare console"
)]
struct Cli {
    /// Configuration file (default: <config dir>/cf-console/config.json)
    #[arg(long, global = true, env = "CFC_CONFIG")]
    config: Option<PathBuf>,

    /// Credential database (overrides the configuration file)
    #[arg(long, global = true, env = "CFC_DATABASE")]
    database: Option<PathBuf>,

    /// Password protecting stored credentials
    #[arg(long, global = true, env = "CFC_STORE_PASSWORD", hide_env_values = true)]
    store_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored accounts and the current account
    #[command(subcommand)]
    Account(AccountCommand),

    /// Call a resource operation as the current account
    Resource(ResourceArgs),

    /// Pages projects and deployments
    #[command(subcommand)]
    Pages(PagesCommand),
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn build_state(cli: &Cli) -> anyhow::Result<AppState> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    }
    .context("failed to load configuration")?;
    if let Some(path) = &cli.database {
        config.storage.database_path = Some(path.clone());
    }

    let db_path = config.storage.resolve_database_path()?;
    if cli.store_password.is_none() {
        tracing::warn!("No store password given; set CFC_STORE_PASSWORD to read credentials");
    }
    let store = SqliteStore::new(&db_path, cli.store_password.clone()).await?;

    let state = AppStateBuilder::new()
        .config(config)
        .credential_store(Arc::new(store))
        .build()
        .await?;
    Ok(state)
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let state = match build_state(&cli).await {
        Ok(state) => state,
        Err(e) => return commands::report_startup_failure(&e),
    };

    match cli.command {
        Commands::Account(command) => commands::account::run(&state, command).await,
        Commands::Resource(args) => commands::resource::run(&state, args).await,
        Commands::Pages(command) => commands::pages::run(&state, command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
