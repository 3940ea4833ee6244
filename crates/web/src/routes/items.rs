//! Public item page and ordering.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use rosewood_core::{AddressId, DistributorId, ItemId, Price};

use crate::db::{
    CollectionRepository, ItemRepository, NewOrder, OrderRepository, ReferenceRepository,
    RepositoryError,
};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAccount, RequireUser};
use crate::models::{CurrentAccount, Item, StockedDistributor};
use crate::routes::user::AddressView;
use crate::state::AppState;

/// Order form on the item page.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub distributor: i32,
    pub address: i32,
    pub deposit: i32,
}

/// Item page template.
#[derive(Template, WebTemplate)]
#[template(path = "item/show.html")]
pub struct ItemTemplate {
    pub account: Option<CurrentAccount>,
    pub item: Item,
    pub vendor_name: String,
    pub category: String,
    pub image_urls: Vec<String>,
    pub tenons: Vec<String>,
    pub stock: i64,
    pub distributors: Vec<StockedDistributor>,
    /// Whether a buyer is logged in.
    pub is_buyer: bool,
    /// Whether the logged-in buyer saved the item.
    pub saved: bool,
    /// The logged-in buyer's addresses, for the order form.
    pub addresses: Vec<AddressView>,
}

async fn live_item(state: &AppState, id: ItemId) -> Result<Item> {
    ItemRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|item| !item.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("item {id}")))
}

/// Display an item with its images, stock and the distributors holding it.
#[instrument(skip(state, account))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAccount(account): OptionalAccount,
    Path(id): Path<i32>,
) -> Result<ItemTemplate> {
    let pool = state.pool();
    let mut item = live_item(&state, ItemId::new(id)).await?;

    let vendor_name = item
        .vendor(pool)
        .await?
        .map(|vendor| vendor.name.clone())
        .unwrap_or_default();
    let category = item
        .second_category(pool)
        .await?
        .map(|category| category.name.clone())
        .unwrap_or_default();

    let mut images = item.images(pool).await?.to_vec();
    let image_urls = images
        .iter_mut()
        .filter_map(|image| image.url(state.media_base()).map(str::to_owned))
        .collect();

    let tenon_ids = item.tenon_ids(pool).await?;
    let tenons = if tenon_ids.is_empty() {
        Vec::new()
    } else {
        ReferenceRepository::new(pool)
            .item_form_options()
            .await?
            .tenons
            .into_iter()
            .filter(|tenon| tenon_ids.iter().any(|id| id.as_i32() == tenon.id))
            .map(|tenon| tenon.name)
            .collect()
    };

    let stock = item.stock_count(pool).await?;
    let distributors = item.in_stock_distributors(pool).await?;

    let buyer = account.as_ref().and_then(|account| account.id.user());
    let (saved, addresses) = match buyer {
        Some(user_id) => (
            CollectionRepository::new(pool)
                .find(user_id, item.id)
                .await?
                .is_some(),
            crate::routes::user::address_views(&state, user_id).await?,
        ),
        None => (false, Vec::new()),
    };

    Ok(ItemTemplate {
        account,
        item,
        vendor_name,
        category,
        image_urls,
        tenons,
        stock,
        distributors,
        is_buyer: buyer.is_some(),
        saved,
        addresses,
    })
}

/// Place an order through a distributor holding the item.
///
/// The deposit is capped at the item's price.
#[instrument(skip_all, fields(user_id = %user_id, item_id = id))]
pub async fn order(
    State(state): State<AppState>,
    RequireUser(user_id, _): RequireUser,
    Path(id): Path<i32>,
    Form(form): Form<OrderForm>,
) -> Result<Redirect> {
    let deposit = Price::new(form.deposit)
        .ok_or_else(|| AppError::BadRequest("deposit cannot be negative".to_string()))?;

    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            user_id,
            user_address_id: AddressId::new(form.address),
            distributor_id: DistributorId::new(form.distributor),
            item_id: ItemId::new(id),
            deposit,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::BadRequest(
                "the item, address or distributor is not available".to_string(),
            ),
            other => other.into(),
        })?;

    tracing::info!(order_id = %order.id, "Order placed");
    Ok(Redirect::to("/user/orders"))
}
