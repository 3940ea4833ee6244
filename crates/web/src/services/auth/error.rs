//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] rosewood_core::EmailError),

    /// Invalid mobile number format.
    #[error("invalid mobile: {0}")]
    InvalidMobile(#[from] rosewood_core::MobileError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The distributor's contract was terminated.
    #[error("account revoked")]
    AccountRevoked,

    /// No account matches.
    #[error("account not found")]
    AccountNotFound,

    /// The mobile number is registered already.
    #[error("mobile already registered")]
    MobileTaken,

    /// The email address is registered already.
    #[error("email already registered")]
    EmailTaken,

    /// The username or brand name is taken.
    #[error("{0} already taken")]
    NameTaken(&'static str),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A form field failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// No unused random username was found.
    #[error("could not generate a free username")]
    UsernameExhausted,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error is the client's fault and its message may be shown.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash | Self::UsernameExhausted)
    }
}
