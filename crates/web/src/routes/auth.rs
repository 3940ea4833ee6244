//! Login, logout, emailed confirmation links and password resets.
//!
//! The four account kinds share these handlers; the router binds each one
//! to a kind under `/<kind>/...`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use rosewood_core::{AccountKind, ConfirmAction};

use crate::error::{Result, user_message};
use crate::middleware::auth::safe_next;
use crate::middleware::{clear_current_account, set_current_account};
use crate::models::{CurrentAccount, PasswordResetGrant, session_keys};
use crate::services::auth::{AuthError, AuthService};
use crate::services::email::{confirm_link, deliver_confirmation};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// Password reset form: the request step sends `email`, the reset step
/// sends `password` and `confirm`.
#[derive(Debug, Default, Deserialize)]
pub struct ResetForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm: Option<String>,
}

/// Where to go after logging in.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Query of an emailed confirmation link.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub action: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub kind: AccountKind,
    pub login_label: &'static str,
    pub login: String,
    pub next: Option<String>,
    pub error: Option<String>,
}

/// Request a reset link.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_request.html")]
pub struct ResetRequestTemplate {
    pub kind: AccountKind,
    pub error: Option<String>,
}

/// Choose a new password after following a reset link.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub kind: AccountKind,
    pub email: String,
    pub error: Option<String>,
}

/// A one-paragraph result page.
#[derive(Template, WebTemplate)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub title: String,
    pub message: String,
    pub link: Option<(String, String)>,
}

impl MessageTemplate {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    #[must_use]
    pub fn with_link(mut self, text: impl Into<String>, href: impl Into<String>) -> Self {
        self.link = Some((text.into(), href.into()));
        self
    }
}

/// What the login field accepts for each kind.
#[must_use]
pub const fn login_label(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::User => "Mobile, email or username",
        AccountKind::Vendor => "Mobile or email",
        AccountKind::Distributor => "Username",
        AccountKind::Privilege => "Username or email",
    }
}

/// Landing page after logging in.
#[must_use]
pub fn home_path(kind: AccountKind) -> String {
    match kind {
        AccountKind::User => "/".to_string(),
        AccountKind::Privilege => "/privilege/vendors".to_string(),
        other => format!("/{}/profile", other.path()),
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(kind: AccountKind, Query(query): Query<NextQuery>) -> impl IntoResponse {
    LoginTemplate {
        kind,
        login_label: login_label(kind),
        login: String::new(),
        next: query.next,
        error: None,
    }
}

/// Handle login form submission.
#[tracing::instrument(skip_all, fields(kind = %kind))]
pub async fn login(
    kind: AccountKind,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(kind, &form.login, &form.password)
        .await
    {
        Ok(account) => {
            set_current_account(&session, &account).await?;
            let target = safe_next(query.next.as_deref(), &home_path(kind));
            Ok(Redirect::to(&target).into_response())
        }
        Err(err @ (AuthError::InvalidCredentials | AuthError::AccountRevoked)) => {
            tracing::info!(error = %err, "Login refused");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    kind,
                    login_label: login_label(kind),
                    login: form.login,
                    next: query.next,
                    error: Some(user_message(&err)),
                },
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Log out and go back to the kind's login page.
pub async fn logout(kind: AccountKind, session: Session) -> Result<Redirect> {
    clear_current_account(&session).await?;
    Ok(Redirect::to(&format!("/{}/login", kind.path())))
}

// =============================================================================
// Emailed links
// =============================================================================

/// Follow an emailed confirmation link.
///
/// `register` creates and logs in the buyer; `reset_password` lets the
/// session choose a new password. Tokens work once.
#[tracing::instrument(skip_all, fields(action = %query.action))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<VerifyQuery>,
) -> Result<Response> {
    let expired = || {
        MessageTemplate::new("Link expired", "This link has expired or was already used.")
            .into_response()
    };

    let Ok(action) = query.action.parse::<ConfirmAction>() else {
        return Ok(expired());
    };
    let Some(pending) = state.confirm_tokens().redeem(&query.token, action).await? else {
        return Ok(expired());
    };

    match action {
        ConfirmAction::Register => {
            let user = match AuthService::new(state.pool())
                .activate_email_registration(&pending)
                .await
            {
                Ok(user) => user,
                Err(err @ AuthError::EmailTaken) => {
                    return Ok(MessageTemplate::new("Already activated", user_message(&err))
                        .with_link("Log in", "/user/login")
                        .into_response());
                }
                Err(err) => return Err(err.into()),
            };
            set_current_account(&session, &CurrentAccount::of(&user)).await?;
            Ok(MessageTemplate::new(
                "Activated",
                format!("Your account is active. Your username is {}.", user.username),
            )
            .with_link("Start browsing", "/")
            .into_response())
        }
        ConfirmAction::ResetPassword => {
            let grant = PasswordResetGrant {
                kind: pending.kind,
                email: pending.email,
            };
            session.insert(session_keys::PASSWORD_RESET, &grant).await?;
            Ok(Redirect::to(&format!("/{}/reset_password", grant.kind.path())).into_response())
        }
    }
}

// =============================================================================
// Password reset
// =============================================================================

async fn reset_grant(session: &Session, kind: AccountKind) -> Result<Option<PasswordResetGrant>> {
    let grant: Option<PasswordResetGrant> = session.get(session_keys::PASSWORD_RESET).await?;
    Ok(grant.filter(|g| g.kind == kind))
}

/// Show the reset form when a reset link was followed, otherwise the form
/// that requests one.
pub async fn reset_password_page(kind: AccountKind, session: Session) -> Result<Response> {
    Ok(match reset_grant(&session, kind).await? {
        Some(grant) => ResetPasswordTemplate {
            kind,
            email: grant.email.into_inner(),
            error: None,
        }
        .into_response(),
        None => ResetRequestTemplate { kind, error: None }.into_response(),
    })
}

/// Request a reset link, or set the new password.
#[tracing::instrument(skip_all, fields(kind = %kind))]
pub async fn reset_password(
    kind: AccountKind,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    if let Some(grant) = reset_grant(&session, kind).await? {
        let password = form.password.unwrap_or_default();
        let confirm = form.confirm.unwrap_or_default();
        return match auth.reset_password(&grant, &password, &confirm).await {
            Ok(()) => {
                session
                    .remove::<PasswordResetGrant>(session_keys::PASSWORD_RESET)
                    .await?;
                Ok(MessageTemplate::new("Password changed", "You can now log in with your new password.")
                    .with_link("Log in", format!("/{}/login", kind.path()))
                    .into_response())
            }
            Err(err) if err.is_user_facing() => Ok((
                StatusCode::BAD_REQUEST,
                ResetPasswordTemplate {
                    kind,
                    email: grant.email.into_inner(),
                    error: Some(user_message(&err)),
                },
            )
                .into_response()),
            Err(err) => Err(err.into()),
        };
    }

    let email = form.email.unwrap_or_default();
    match auth.request_password_reset(kind, &email).await {
        Ok(Some(pending)) => {
            let token = state.confirm_tokens().issue(&pending).await?;
            let link = confirm_link(&state.config().base_url, &token, ConfirmAction::ResetPassword);
            deliver_confirmation(state.email(), &pending.email, &link, ConfirmAction::ResetPassword)
                .await?;
        }
        Ok(None) => {}
        Err(err) if err.is_user_facing() => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ResetRequestTemplate {
                    kind,
                    error: Some(user_message(&err)),
                },
            )
                .into_response());
        }
        Err(err) => return Err(err.into()),
    }

    Ok(MessageTemplate::new(
        "Check your inbox",
        "If an account uses this address, a reset link is on its way.",
    )
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_paths() {
        assert_eq!(home_path(AccountKind::User), "/");
        assert_eq!(home_path(AccountKind::Vendor), "/vendor/profile");
        assert_eq!(home_path(AccountKind::Distributor), "/distributor/profile");
        assert_eq!(home_path(AccountKind::Privilege), "/privilege/vendors");
    }

    #[test]
    fn test_login_template_renders_kind() {
        let html = LoginTemplate {
            kind: AccountKind::Distributor,
            login_label: login_label(AccountKind::Distributor),
            login: "10293847".to_string(),
            next: Some("/distributor/stock".to_string()),
            error: Some("Wrong account or password".to_string()),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("/distributor/login"));
        assert!(html.contains("10293847"));
        assert!(html.contains("Wrong account or password"));
    }

    #[test]
    fn test_message_template() {
        let html = MessageTemplate::new("Link expired", "Try again")
            .with_link("Log in", "/user/login")
            .render()
            .unwrap_or_default();
        assert!(html.contains("Link expired"));
        assert!(html.contains("href=\"/user/login\""));
    }
}
