//! Rosewood CLI - database migrations, seed data and administrators.
//!
//! # Usage
//!
//! ```bash
//! # Apply SQL migrations
//! rw-cli migrate
//!
//! # Load categories, scenes, materials and the default administrator
//! rw-cli seed reference --admin-password 'k7#Qp2@vL9!x'
//!
//! # Load provinces, cities and districts
//! rw-cli seed regions
//!
//! # Create demo vendors with addresses in random districts
//! rw-cli seed vendors --count 20
//!
//! # Create an administrator
//! rw-cli privilege create -u ops -e ops@rosewood.test -p 'k7#Qp2@vL9!x'
//! ```
//!
//! Every command reads `ROSEWOOD_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "rw-cli")]
#[command(author, version, about = "Rosewood CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load seed data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage administrators
    Privilege {
        #[command(subcommand)]
        action: PrivilegeAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Categories, scenes, craft options and the default `admin` account
    Reference {
        /// Password of the default administrator (generated when omitted)
        #[arg(long, env = "ROSEWOOD_ADMIN_PASSWORD")]
        admin_password: Option<String>,

        /// Email of the default administrator
        #[arg(long, default_value = "admin@rosewood.local")]
        admin_email: String,
    },
    /// Provinces, cities and districts from the embedded code table
    Regions,
    /// Demo vendors, skipped when any vendor exists
    Vendors {
        /// Number of vendors to create
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
}

#[derive(Subcommand)]
enum PrivilegeAction {
    /// Create a new administrator
    Create {
        /// Login username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "ROSEWOOD_PRIVILEGE_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Reference {
                admin_password,
                admin_email,
            } => commands::seed::reference(admin_password, &admin_email).await?,
            SeedTarget::Regions => commands::seed::regions().await?,
            SeedTarget::Vendors { count } => commands::seed::vendors(count).await?,
        },
        Commands::Privilege { action } => match action {
            PrivilegeAction::Create {
                username,
                email,
                password,
            } => {
                commands::privilege::create(&username, &email, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_vendors() {
        let cli = Cli::try_parse_from(["rw-cli", "seed", "vendors", "--count", "3"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed {
                target: SeedTarget::Vendors { count: 3 }
            })
        ));
    }
}
