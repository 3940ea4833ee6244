//! Subcommand implementations.

pub mod migrate;
pub mod privilege;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use rosewood_web::db::{self, RepositoryError};
use rosewood_web::services::auth::AuthError;

/// Errors that can stop a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A repository call failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Account creation was refused.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The embedded region table could not be planned.
    #[error("Region table: {0}")]
    Region(#[from] rosewood_core::region::RegionError),

    /// A precondition for seeding is not met.
    #[error("{0}")]
    Precondition(&'static str),
}

/// Connect using `ROSEWOOD_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("ROSEWOOD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("ROSEWOOD_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&SecretString::from(url)).await?)
}
