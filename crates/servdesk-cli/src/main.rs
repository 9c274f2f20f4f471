//! servdesk CLI - manage service-desk record attachments
//!
//! Drives the shared attachment lifecycle manager against a local record
//! store so job, issue, and parts-request attachments can be scripted.

mod cli;
mod commands;
mod error;
mod paths;
mod store;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::attachments::run_attachments;
use crate::commands::config::run_config;
use crate::commands::record::run_record;
use crate::error::CliError;
use crate::paths::{resolve_settings_path, resolve_store_path};
use crate::store::RecordStore;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("servdesk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings_path = resolve_settings_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Record { command } => {
            let store = RecordStore::new(resolve_store_path(cli.store.as_deref())?);
            run_record(command, &store, &settings_path).await
        }
        Commands::Attachments { command } => {
            let store = RecordStore::new(resolve_store_path(cli.store.as_deref())?);
            run_attachments(command, &store, &settings_path).await
        }
        Commands::Config { command } => run_config(command, &settings_path),
    }
}
