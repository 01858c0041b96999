//! Adire CLI - Database migrations and order tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront migrations (tables and the session store)
//! adire-cli migrate
//!
//! # List the 20 most recent orders
//! adire-cli orders list --limit 20
//!
//! # Same, as JSON
//! adire-cli orders list --json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adire-cli")]
#[command(author, version, about = "Adire storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Maximum number of orders
        #[arg(short, long, default_value_t = 50)]
        limit: u32,

        /// Number of orders to skip
        #[arg(short, long, default_value_t = 0)]
        offset: u32,

        /// Print full orders as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Orders { action } => match action {
            OrdersAction::List {
                limit,
                offset,
                json,
            } => commands::orders::list(limit, offset, json).await?,
        },
    }
    Ok(())
}
