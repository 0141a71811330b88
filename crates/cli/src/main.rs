//! Lustre CLI - session migrations and profile maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table in the storefront database
//! lustre-cli migrate
//!
//! # Show which accounts are missing a profile
//! lustre-cli sync profiles --dry-run
//!
//! # Insert the missing profiles
//! lustre-cli sync profiles
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL` (falling back to
//! `DATABASE_URL`), loading `.env` first if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lustre-cli")]
#[command(author, version, about = "Lustre CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the session store table
    Migrate,
    /// Reconcile derived records
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Insert a profile for every account that has none
    Profiles {
        /// Report what would be inserted without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await,
        Commands::Sync { target } => match target {
            SyncTarget::Profiles { dry_run } => commands::sync::profiles(dry_run).await,
        },
    }
}
