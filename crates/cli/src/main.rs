//! Shoplog CLI - Database migrations and manual event syncs.
//!
//! # Usage
//!
//! ```bash
//! # Apply the admin database migrations
//! shoplog-cli migrate
//!
//! # Pull new events for the configured shop into the store
//! shoplog-cli sync
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Run one watermark sync for the configured shop

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shoplog-cli")]
#[command(author, version, about = "Shoplog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Sync the configured shop's events from Shopify
    Sync,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync => {
            commands::sync::run().await?;
        }
    }
    Ok(())
}
