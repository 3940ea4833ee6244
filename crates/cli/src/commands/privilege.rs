//! Administrator management.

use rosewood_web::services::auth::AuthService;

use super::{CommandError, connect};

/// Create an administrator account.
///
/// # Errors
///
/// Returns `CommandError::Auth` if a field is invalid or the username or
/// email is taken.
pub async fn create(username: &str, email: &str, password: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let privilege = AuthService::new(&pool)
        .create_privilege(username, email, password)
        .await?;

    tracing::info!(
        "Administrator created! ID: {}, Username: {}",
        privilege.id,
        privilege.username
    );
    Ok(())
}
