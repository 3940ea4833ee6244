//! Administrator repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{Email, PrivilegeId};

use super::{RepositoryError, conflict_on_unique, parse_email};
use crate::models::Privilege;

#[derive(sqlx::FromRow)]
struct PrivilegeRow {
    id: i32,
    username: String,
    email: String,
    email_confirmed: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PrivilegeLoginRow {
    #[sqlx(flatten)]
    privilege: PrivilegeRow,
    password_hash: String,
}

impl TryFrom<PrivilegeRow> for Privilege {
    type Error = RepositoryError;

    fn try_from(row: PrivilegeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PrivilegeId::new(row.id),
            username: row.username,
            email: parse_email(&row.email)?,
            email_confirmed: row.email_confirmed,
            created_at: row.created_at,
        })
    }
}

/// Repository for administrator database operations.
pub struct PrivilegeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PrivilegeRepository<'a> {
    /// Create a new privilege repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an administrator by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PrivilegeId) -> Result<Option<Privilege>, RepositoryError> {
        sqlx::query_as::<_, PrivilegeRow>(
            r"
            SELECT id, username, email, email_confirmed, created_at
            FROM marketplace.privileges
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Privilege::try_from)
        .transpose()
    }

    /// Find an administrator by username or email, with the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(
        &self,
        login: &str,
    ) -> Result<Option<(Privilege, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, PrivilegeLoginRow>(
            r"
            SELECT id, username, email, email_confirmed, created_at, password_hash
            FROM marketplace.privileges
            WHERE username = $1 OR email = lower($1)
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((Privilege::try_from(r.privilege)?, r.password_hash)))
            .transpose()
    }

    /// Create an administrator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<Privilege, RepositoryError> {
        let row = sqlx::query_as::<_, PrivilegeRow>(
            r"
            INSERT INTO marketplace.privileges (username, email, password_hash, email_confirmed)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, username, email, email_confirmed, created_at
            ",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "privilege"))?;

        Privilege::try_from(row)
    }

    /// List all administrators.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Privilege>, RepositoryError> {
        sqlx::query_as::<_, PrivilegeRow>(
            r"
            SELECT id, username, email, email_confirmed, created_at
            FROM marketplace.privileges
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Privilege::try_from)
        .collect()
    }
}
