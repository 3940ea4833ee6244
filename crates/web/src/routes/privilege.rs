//! Administrator pages: vendor verification and revocation review.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use rosewood_core::{RemindStatus, RevocationId, VendorId};

use crate::db::{RevocationRepository, VendorRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequirePrivilege;
use crate::models::{CurrentAccount, Vendor};
use crate::services::media::media_url;
use crate::state::AppState;

/// Longest rejection message accepted, matching `vendors.reject_message`.
const MAX_REJECT_MESSAGE_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RejectForm {
    pub message: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "privilege/vendors.html")]
pub struct VendorsTemplate {
    pub account: CurrentAccount,
    pub vendors: Vec<Vendor>,
}

/// A pending revocation with its distributor.
#[derive(Debug, Clone)]
pub struct RevocationRow {
    pub id: RevocationId,
    pub distributor: String,
    pub username: String,
    pub contract_url: Option<String>,
    pub filed_at: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "privilege/revocations.html")]
pub struct RevocationsTemplate {
    pub account: CurrentAccount,
    pub revocations: Vec<RevocationRow>,
}

/// List vendors awaiting verification.
pub async fn vendors(
    State(state): State<AppState>,
    RequirePrivilege(_, account): RequirePrivilege,
) -> Result<VendorsTemplate> {
    let vendors = VendorRepository::new(state.pool()).list_pending().await?;
    Ok(VendorsTemplate { account, vendors })
}

/// Approve a vendor and let it list items.
#[instrument(skip_all, fields(privilege_id = %privilege_id, vendor_id = id))]
pub async fn confirm_vendor(
    State(state): State<AppState>,
    RequirePrivilege(privilege_id, _): RequirePrivilege,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let vendor_id = VendorId::new(id);
    VendorRepository::new(state.pool()).confirm(vendor_id).await?;
    state
        .reminds()
        .push_vendor_confirm(vendor_id, RemindStatus::Success, "")
        .await?;
    tracing::info!("Vendor confirmed");
    Ok(Redirect::to("/privilege/vendors"))
}

/// Turn a vendor down with a message it will see on its dashboard.
#[instrument(skip_all, fields(privilege_id = %privilege_id, vendor_id = id))]
pub async fn reject_vendor(
    State(state): State<AppState>,
    RequirePrivilege(privilege_id, _): RequirePrivilege,
    Path(id): Path<i32>,
    Form(form): Form<RejectForm>,
) -> Result<Redirect> {
    let message = reject_message(&form)?;
    let vendor_id = VendorId::new(id);
    VendorRepository::new(state.pool())
        .reject(vendor_id, message)
        .await?;
    state
        .reminds()
        .push_vendor_confirm(vendor_id, RemindStatus::Danger, message)
        .await?;
    tracing::info!("Vendor rejected");
    Ok(Redirect::to("/privilege/vendors"))
}

/// The trimmed rejection message, refused when empty or too long.
fn reject_message(form: &RejectForm) -> Result<&str> {
    let message = form.message.trim();
    if message.is_empty() || message.chars().count() > MAX_REJECT_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "a rejection message of at most {MAX_REJECT_MESSAGE_LEN} characters is required"
        )));
    }
    Ok(message)
}

/// List revocations waiting for review.
pub async fn revocations(
    State(state): State<AppState>,
    RequirePrivilege(_, account): RequirePrivilege,
) -> Result<RevocationsTemplate> {
    let pool = state.pool();
    let pending = RevocationRepository::new(pool).list_pending().await?;

    let mut rows = Vec::with_capacity(pending.len());
    for mut revocation in pending {
        let (distributor, username) = revocation
            .distributor(pool)
            .await?
            .map(|d| (d.name.clone(), d.username.clone()))
            .unwrap_or_default();
        rows.push(RevocationRow {
            id: revocation.id,
            distributor,
            username,
            contract_url: media_url(state.media_base(), &revocation.contract),
            filed_at: revocation.created_at.format("%Y-%m-%d %H:%M").to_string(),
        });
    }

    Ok(RevocationsTemplate {
        account,
        revocations: rows,
    })
}

/// Approve a revocation; the distributor is revoked.
#[instrument(skip_all, fields(privilege_id = %privilege_id, revocation_id = id))]
pub async fn approve_revocation(
    State(state): State<AppState>,
    RequirePrivilege(privilege_id, _): RequirePrivilege,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let distributor_id = RevocationRepository::new(state.pool())
        .approve(RevocationId::new(id))
        .await?;
    tracing::info!(distributor_id = %distributor_id, "Distributor revoked");
    Ok(Redirect::to("/privilege/revocations"))
}

/// Turn a revocation down.
#[instrument(skip_all, fields(privilege_id = %privilege_id, revocation_id = id))]
pub async fn reject_revocation(
    State(state): State<AppState>,
    RequirePrivilege(privilege_id, _): RequirePrivilege,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    RevocationRepository::new(state.pool())
        .reject(RevocationId::new(id))
        .await?;
    tracing::info!("Revocation rejected");
    Ok(Redirect::to("/privilege/revocations"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::*;

    fn form(message: String) -> RejectForm {
        RejectForm { message }
    }

    #[test]
    fn test_reject_message_fits_column() {
        let longest = form(format!(" {} ", "资".repeat(MAX_REJECT_MESSAGE_LEN)));
        assert_eq!(reject_message(&longest).unwrap().chars().count(), 100);

        let too_long = form("资".repeat(MAX_REJECT_MESSAGE_LEN + 1));
        let response = reject_message(&too_long).unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reject_message_required() {
        let blank = form("   ".to_string());
        assert!(matches!(
            reject_message(&blank),
            Err(AppError::BadRequest(_))
        ));
    }
}
