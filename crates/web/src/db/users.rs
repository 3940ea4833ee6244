//! Buyer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{Email, Mobile, UserId};

use super::{RepositoryError, conflict_on_unique, parse_email, parse_mobile};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    nickname: String,
    mobile: Option<String>,
    email: Option<String>,
    email_confirmed: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserLoginRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            nickname: row.nickname,
            mobile: row.mobile.as_deref().map(parse_mobile).transpose()?,
            email: row.email.as_deref().map(parse_email).transpose()?,
            email_confirmed: row.email_confirmed,
            created_at: row.created_at,
        })
    }
}

/// Fields for a new buyer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    /// Display name chosen at registration; empty when none was given.
    pub nickname: String,
    pub mobile: Option<Mobile>,
    pub email: Option<Email>,
    /// Set when the account was created from a confirmed email link.
    pub email_confirmed: bool,
    pub password_hash: String,
}

/// Repository for buyer database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, nickname, mobile, email, email_confirmed, created_at
            FROM marketplace.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, nickname, mobile, email, email_confirmed, created_at
            FROM marketplace.users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Find a user by mobile, email or username, with the password hash.
    ///
    /// A mobile match wins over an email match, which wins over a username
    /// match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(
        &self,
        login: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserLoginRow>(
            r"
            SELECT id, username, nickname, mobile, email, email_confirmed, created_at, password_hash
            FROM marketplace.users
            WHERE mobile = $1 OR email = lower($1) OR username = $1
            ORDER BY
                mobile IS NOT DISTINCT FROM $1 DESC,
                email IS NOT DISTINCT FROM lower($1) DESC,
                id
            LIMIT 1
            ",
        )
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Whether a mobile number is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mobile_exists(&self, mobile: &Mobile) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.users WHERE mobile = $1)",
        )
        .bind(mobile)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether an email address is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether a username is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username, mobile or email
    /// is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO marketplace.users
                (username, nickname, mobile, email, email_confirmed, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, nickname, mobile, email, email_confirmed, created_at
            ",
        )
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(user.mobile.as_ref())
        .bind(user.email.as_ref())
        .bind(user.email_confirmed)
        .bind(&user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "account"))?;

        User::try_from(row)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE marketplace.users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
