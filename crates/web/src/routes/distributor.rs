//! Distributor pages: dashboard, stock sheet and contract termination.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use rosewood_core::{DistributorId, ItemId, RevocationState};

use crate::db::{DistributorRepository, ItemRepository, StockRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireDistributor;
use crate::models::{CurrentAccount, Distributor, Reminds, StockLine};
use crate::routes::vendor::{RevokeForm, file_revocation};
use crate::state::AppState;

/// One stock count change.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub item: i32,
    pub stock: i32,
}

#[derive(Template, WebTemplate)]
#[template(path = "distributor/profile.html")]
pub struct ProfileTemplate {
    pub account: CurrentAccount,
    pub distributor: Distributor,
    pub vendor_name: String,
    pub address: String,
    pub revocation: RevocationState,
    pub reminds: Reminds,
}

#[derive(Template, WebTemplate)]
#[template(path = "distributor/stock.html")]
pub struct StockTemplate {
    pub account: CurrentAccount,
    pub lines: Vec<StockLine>,
    pub revoked: bool,
}

async fn load_distributor(state: &AppState, id: DistributorId) -> Result<Distributor> {
    DistributorRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("distributor {id}")))
}

/// Display the dashboard with reminds and the revocation state.
pub async fn profile(
    State(state): State<AppState>,
    RequireDistributor(distributor_id, account): RequireDistributor,
) -> Result<ProfileTemplate> {
    let pool = state.pool();
    let mut distributor = load_distributor(&state, distributor_id).await?;

    let vendor_name = distributor
        .vendor(pool)
        .await?
        .map(|vendor| vendor.name.clone())
        .unwrap_or_default();
    let address = match distributor.address(pool).await? {
        Some(address) => address.precise_address(pool).await?,
        None => String::new(),
    };
    let revocation = distributor.revocation_state(pool).await?;
    let reminds = state.reminds().distributor_reminds(distributor_id).await?;

    Ok(ProfileTemplate {
        account,
        distributor,
        vendor_name,
        address,
        revocation,
        reminds,
    })
}

/// Display the stock sheet over the vendor's live items.
pub async fn stock(
    State(state): State<AppState>,
    RequireDistributor(distributor_id, account): RequireDistributor,
) -> Result<StockTemplate> {
    let distributor = load_distributor(&state, distributor_id).await?;
    let lines = StockRepository::new(state.pool())
        .sheet_for_distributor(distributor_id)
        .await?;
    Ok(StockTemplate {
        account,
        lines,
        revoked: distributor.is_revoked,
    })
}

/// Set how many units of one item the distributor holds.
#[instrument(skip_all, fields(distributor_id = %distributor_id, item_id = form.item))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireDistributor(distributor_id, _): RequireDistributor,
    Form(form): Form<StockForm>,
) -> Result<Redirect> {
    if form.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_string()));
    }

    let distributor = load_distributor(&state, distributor_id).await?;
    if distributor.is_revoked {
        return Err(AppError::Forbidden("distributor is revoked".to_string()));
    }

    let item_id = ItemId::new(form.item);
    ItemRepository::new(state.pool())
        .get_by_id(item_id)
        .await?
        .filter(|item| !item.is_deleted && item.vendor_id == distributor.vendor_id)
        .ok_or_else(|| AppError::NotFound(format!("item {item_id}")))?;

    StockRepository::new(state.pool())
        .upsert(distributor_id, item_id, form.stock)
        .await?;
    Ok(Redirect::to("/distributor/stock"))
}

/// File a revocation of the distributor's own contract.
#[instrument(skip_all, fields(distributor_id = %distributor_id))]
pub async fn revoke(
    State(state): State<AppState>,
    RequireDistributor(distributor_id, _): RequireDistributor,
    Form(form): Form<RevokeForm>,
) -> Result<Redirect> {
    file_revocation(&state, distributor_id, &form.contract).await?;
    Ok(Redirect::to("/distributor/profile"))
}
