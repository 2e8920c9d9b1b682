//! BeezeTrack CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bzt-cli migrate
//!
//! # Insert the demo deliveries (BZ123456, BZ789012, BZ345678, BZ901234)
//! bzt-cli seed demo
//!
//! # Create an account
//! bzt-cli user create -e jo@example.com -n "Jo Courier" -p "correct horse"
//! ```
//!
//! All commands read `BEEZETRACK_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bzt-cli")]
#[command(author, version, about = "BeezeTrack CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the demo deliveries shared by every account
    Demo,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
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
        Commands::Seed { target } => match target {
            SeedTarget::Demo => commands::seed::demo().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
            } => {
                let id = commands::user::create(&email, &name, &password).await?;
                tracing::info!(user_id = %id, "User created");
            }
        },
    }
    Ok(())
}
