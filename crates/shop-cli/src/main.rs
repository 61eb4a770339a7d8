//! Linepicplus shop CLI - admin accounts, seed data and store inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin (password read from ADMIN_PASSWORD or --password)
//! ADMIN_PASSWORD=changeme shop-cli admin create -e admin@example.com -n "Admin" -r super_admin
//!
//! # List admins
//! shop-cli admin list
//!
//! # Load the demo catalog and coupons
//! shop-cli seed
//!
//! # Show record counts per collection
//! shop-cli collections
//! ```
//!
//! All commands operate on the file store under `DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Linepicplus shop management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the store with the demo catalog and coupons
    Seed,
    /// Show record counts per collection
    Collections,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Admin password
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List admin accounts
    List,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::open_store()?;

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(store, &email, &name, &role, &password).await?;
            }
            AdminAction::List => commands::admin::list_users(store).await?,
        },
        Commands::Seed => {
            let summary = commands::seed::run(store).await?;
            tracing::info!(
                products = summary.products_created,
                coupons = summary.coupons_created,
                skipped = summary.skipped,
                "Seed complete"
            );
        }
        Commands::Collections => commands::collections::print_counts(store).await?,
    }
    Ok(())
}
