//! HTTP route handlers for the marketplace.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Recently listed items
//! GET  /health                            - Health check
//! GET  /health/ready                      - Readiness check (database)
//! GET  /regions?parent=<cn_id>            - Child regions as JSON
//! GET  /items/{id}                        - Item page
//! POST /items/{id}/order                  - Place an order (buyer)
//!
//! # Shared by every account kind (<kind> = user, vendor, distributor, privilege)
//! GET  /<kind>/login                      - Login page
//! POST /<kind>/login                      - Login action
//! POST /<kind>/logout                     - Logout action
//!
//! # Buyers
//! GET  /user/register                     - Registration wizard (?restart=1)
//! POST /user/register?form=mobile|email   - Registration wizard step
//! POST /user/reg_email                    - Email registration (`ok` / `false`)
//! GET  /user/verify?token=&action=        - Follow an emailed link
//! GET  /user/reset_password               - Request or finish a reset
//! POST /user/reset_password
//! GET  /user/profile                      - Profile
//! GET  /user/collection                   - Wishlist (50 per page)
//! POST /user/collection                   - Save `item` (`ok`)
//! DELETE /user/collection                 - Unsave `item` (`ok`)
//! GET  /user/orders                       - Orders
//! GET  /user/addresses                    - Delivery addresses
//! POST /user/addresses                    - Add an address
//!
//! # Vendors
//! GET  /vendor/register                   - Registration wizard (?restart=1)
//! POST /vendor/register?form=mobile       - Registration wizard step
//! GET  /vendor/reset_password             - Request or finish a reset
//! POST /vendor/reset_password
//! GET  /vendor/profile                    - Dashboard with reminds
//! GET  /vendor/reconfirm                  - Resubmit agent data
//! POST /vendor/reconfirm
//! GET  /vendor/items                      - Items (100 per page)
//! GET  /vendor/items/new                  - New item form
//! POST /vendor/items/new
//! POST /vendor/items/{id}/delete          - Soft-delete an item
//! GET  /vendor/distributors               - Distributors
//! POST /vendor/distributors               - Create a distributor
//! POST /vendor/distributors/{id}/revoke   - File a revocation
//!
//! # Distributors
//! GET  /distributor/profile               - Dashboard with reminds
//! GET  /distributor/stock                 - Stock sheet
//! POST /distributor/stock                 - Set one stock count
//! POST /distributor/revoke                - File a revocation
//!
//! # Administrators
//! GET  /privilege/vendors                 - Vendors awaiting review
//! POST /privilege/vendors/{id}/confirm
//! POST /privilege/vendors/{id}/reject
//! GET  /privilege/revocations             - Pending revocations
//! POST /privilege/revocations/{id}/approve
//! POST /privilege/revocations/{id}/reject
//! ```

pub mod auth;
pub mod distributor;
pub mod home;
pub mod items;
pub mod privilege;
pub mod regions;
pub mod user;
pub mod vendor;

use axum::{
    Form, Router,
    extract::{Query, State},
    routing::{get, post},
};
use tower_sessions::Session;

use rosewood_core::AccountKind;

use crate::state::AppState;

/// Login and logout for one account kind.
pub fn login_routes(kind: AccountKind) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(move |query: Query<auth::NextQuery>| auth::login_page(kind, query)).post(
                move |state: State<AppState>,
                      session: Session,
                      query: Query<auth::NextQuery>,
                      form: Form<auth::LoginForm>| {
                    auth::login(kind, state, session, query, form)
                },
            ),
        )
        .route(
            "/logout",
            post(move |session: Session| auth::logout(kind, session)),
        )
}

/// Password reset for one account kind.
pub fn reset_routes(kind: AccountKind) -> Router<AppState> {
    Router::new().route(
        "/reset_password",
        get(move |session: Session| auth::reset_password_page(kind, session)).post(
            move |state: State<AppState>, session: Session, form: Form<auth::ResetForm>| {
                auth::reset_password(kind, state, session, form)
            },
        ),
    )
}

/// Create the buyer routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .merge(login_routes(AccountKind::User))
        .merge(reset_routes(AccountKind::User))
        .route("/register", get(user::register_page).post(user::register))
        .route("/reg_email", post(user::reg_email))
        .route("/verify", get(auth::verify))
        .route("/profile", get(user::profile))
        .route(
            "/collection",
            get(user::collection)
                .post(user::save_item)
                .delete(user::unsave_item),
        )
        .route("/orders", get(user::orders))
        .route("/addresses", get(user::addresses).post(user::create_address))
}

/// Create the vendor routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .merge(login_routes(AccountKind::Vendor))
        .merge(reset_routes(AccountKind::Vendor))
        .route("/register", get(vendor::register_page).post(vendor::register))
        .route("/profile", get(vendor::profile))
        .route("/reconfirm", get(vendor::reconfirm_page).post(vendor::reconfirm))
        .route("/items", get(vendor::items))
        .route("/items/new", get(vendor::new_item_page).post(vendor::create_item))
        .route("/items/{id}/delete", post(vendor::delete_item))
        .route(
            "/distributors",
            get(vendor::distributors).post(vendor::create_distributor),
        )
        .route("/distributors/{id}/revoke", post(vendor::revoke_distributor))
}

/// Create the distributor routes router.
pub fn distributor_routes() -> Router<AppState> {
    Router::new()
        .merge(login_routes(AccountKind::Distributor))
        .route("/profile", get(distributor::profile))
        .route("/stock", get(distributor::stock).post(distributor::set_stock))
        .route("/revoke", post(distributor::revoke))
}

/// Create the administrator routes router.
pub fn privilege_routes() -> Router<AppState> {
    Router::new()
        .merge(login_routes(AccountKind::Privilege))
        .route("/vendors", get(privilege::vendors))
        .route("/vendors/{id}/confirm", post(privilege::confirm_vendor))
        .route("/vendors/{id}/reject", post(privilege::reject_vendor))
        .route("/revocations", get(privilege::revocations))
        .route(
            "/revocations/{id}/approve",
            post(privilege::approve_revocation),
        )
        .route("/revocations/{id}/reject", post(privilege::reject_revocation))
}

/// Create all routes for the marketplace.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/health/ready", get(home::readiness))
        .route("/regions", get(regions::children))
        .route("/items/{id}", get(items::show))
        .route("/items/{id}/order", post(items::order))
        .nest("/user", user_routes())
        .nest("/vendor", vendor_routes())
        .nest("/distributor", distributor_routes())
        .nest("/privilege", privilege_routes())
}
