//! Home page and health checks.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use rosewood_core::{ItemId, Price};

use crate::error::Result;
use crate::middleware::OptionalAccount;
use crate::models::{CurrentAccount, Item};
use crate::db::ItemRepository;
use crate::state::AppState;

/// Number of items on the home page.
const RECENT_ITEMS: i64 = 24;

/// An item tile.
#[derive(Debug, Clone)]
pub struct ItemCard {
    pub id: ItemId,
    pub item: String,
    pub price: Price,
    pub image_url: Option<String>,
}

impl ItemCard {
    /// Build a tile, loading the item's first image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the images cannot be loaded.
    pub async fn load(
        mut item: Item,
        pool: &sqlx::PgPool,
        media_base: &str,
    ) -> std::result::Result<Self, crate::db::RepositoryError> {
        let image_url = item
            .images(pool)
            .await?
            .first()
            .cloned()
            .and_then(|mut image| image.url(media_base).map(str::to_owned));
        Ok(Self {
            id: item.id,
            item: item.item,
            price: item.price,
            image_url,
        })
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub account: Option<CurrentAccount>,
    pub items: Vec<ItemCard>,
}

/// Display the home page with the most recently listed items.
#[instrument(skip(state, account))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAccount(account): OptionalAccount,
) -> Result<HomeTemplate> {
    let recent = ItemRepository::new(state.pool())
        .list_recent(RECENT_ITEMS)
        .await?;

    let mut items = Vec::with_capacity(recent.len());
    for item in recent {
        items.push(ItemCard::load(item, state.pool(), state.media_base()).await?);
    }

    Ok(HomeTemplate { account, items })
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
