//! Authentication extractors.
//!
//! The session stores one [`CurrentAccount`] whatever the kind. Each
//! `Require*` extractor accepts only its own kind and sends everyone else
//! to that kind's login page with a `next` parameter pointing back.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use rosewood_core::{AccountKind, DistributorId, PrivilegeId, UserId, VendorId};

use crate::models::{CurrentAccount, session_keys};

/// Error returned when a page needs an account of another kind.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the kind's login page, then back to `next`.
    RedirectToLogin { kind: AccountKind, next: String },
    /// No session layer in the stack.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { kind, next } => Redirect::to(&login_url(kind, &next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// `/<kind>/login?next=<encoded path>`.
#[must_use]
pub fn login_url(kind: AccountKind, next: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/{}/login?next={next}", kind.path())
}

/// Only accept same-site paths as redirect targets after login.
///
/// Browsers read `\` as `/`, so a backslash anywhere is refused the same
/// way as a protocol-relative `//host` target.
#[must_use]
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_owned()
        }
        _ => fallback.to_owned(),
    }
}

async fn current_account(parts: &Parts) -> Option<CurrentAccount> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await
        .ok()
        .flatten()
}

async fn require_kind(parts: &Parts, kind: AccountKind) -> Result<CurrentAccount, AuthRejection> {
    if parts.extensions.get::<Session>().is_none() {
        return Err(AuthRejection::Unauthorized);
    }
    match current_account(parts).await {
        Some(account) if account.kind() == kind => Ok(account),
        _ => {
            let next = parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);
            Err(AuthRejection::RedirectToLogin { kind, next })
        }
    }
}

macro_rules! require_extractor {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $id:ty, $getter:ident) => {
        $(#[$doc])*
        pub struct $name(pub $id, pub CurrentAccount);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = AuthRejection;

            async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
                let account = require_kind(parts, $kind).await?;
                let id = account.id.$getter().ok_or(AuthRejection::Unauthorized)?;
                Ok(Self(id, account))
            }
        }
    };
}

require_extractor!(
    /// Extractor for buyer pages.
    RequireUser,
    AccountKind::User,
    UserId,
    user
);
require_extractor!(
    /// Extractor for vendor pages.
    RequireVendor,
    AccountKind::Vendor,
    VendorId,
    vendor
);
require_extractor!(
    /// Extractor for distributor pages.
    RequireDistributor,
    AccountKind::Distributor,
    DistributorId,
    distributor
);
require_extractor!(
    /// Extractor for administrator pages.
    RequirePrivilege,
    AccountKind::Privilege,
    PrivilegeId,
    privilege
);

/// Extractor that optionally gets whoever is logged in.
///
/// Unlike the `Require*` extractors, this never rejects the request.
pub struct OptionalAccount(pub Option<CurrentAccount>);

impl<S> FromRequestParts<S> for OptionalAccount
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_account(parts).await))
    }
}

/// Store the logged-in account in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_account(
    session: &Session,
    account: &CurrentAccount,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ACCOUNT, account).await?;
    crate::error::set_sentry_user(&account.id);
    Ok(())
}

/// Clear the session identity and everything else in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_account(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    crate::error::clear_sentry_user();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url(AccountKind::Vendor, "/vendor/items?page=2"),
            "/vendor/login?next=%2Fvendor%2Fitems%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/user/profile"), "/"), "/user/profile");
        assert_eq!(safe_next(Some("//evil.test/x"), "/"), "/");
        assert_eq!(safe_next(Some("https://evil.test"), "/"), "/");
        assert_eq!(safe_next(Some("/\\evil.test/phish"), "/"), "/");
        assert_eq!(safe_next(Some("/user\\..\\x"), "/"), "/");
        assert_eq!(safe_next(Some("/\t/evil.test"), "/"), "/");
        assert_eq!(safe_next(None, "/vendor/profile"), "/vendor/profile");
    }
}
