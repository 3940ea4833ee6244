//! Buyer pages: registration wizard, profile, wishlist, orders and addresses.

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
use tracing::instrument;

use rosewood_core::region::RegionCode;
use rosewood_core::{AccountKind, ConfirmAction, ItemId, Mobile};

use crate::db::{
    AddressRepository, CollectionRepository, ItemRepository, OrderRepository, Page, PageRequest,
    RegionRepository, UserRepository,
};
use crate::error::{AppError, Result, user_message};
use crate::middleware::{RequireUser, set_current_account};
use crate::models::{
    CollectionEntry, CurrentAccount, Order, RegistrationStep, User, session_keys,
};
use crate::routes::auth::MessageTemplate;
use crate::services::auth::{AuthError, AuthService, UserDetails};
use crate::services::email::{confirm_link, deliver_confirmation};
use crate::services::registration::{WizardAction, WizardForm, route};
use crate::state::AppState;

/// Wishlist page size.
pub const COLLECTION_PAGE_SIZE: u32 = 50;

/// Longest street address accepted.
const MAX_ADDRESS_LEN: usize = 100;

// =============================================================================
// Form Types
// =============================================================================

/// Query string of the registration wizard.
#[derive(Debug, Default, Deserialize)]
pub struct WizardQuery {
    pub form: Option<String>,
    pub restart: Option<String>,
}

/// Every field any wizard step may post.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
    pub nickname: Option<String>,
}

/// `/user/reg_email` form.
#[derive(Debug, Deserialize)]
pub struct RegEmailForm {
    pub email: String,
    pub password: String,
}

/// Wishlist change.
#[derive(Debug, Deserialize)]
pub struct CollectionForm {
    pub item: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// New delivery address. The region select posts an empty code until a
/// district is chosen.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub cn_id: String,
    pub address: String,
    pub mobile: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Step 0: mobile or email.
#[derive(Template, WebTemplate)]
#[template(path = "user/register.html")]
pub struct RegisterTemplate {
    pub mobile: String,
    pub email: String,
    pub error: Option<String>,
}

/// Step 1: password and nickname for the stored mobile.
#[derive(Template, WebTemplate)]
#[template(path = "user/register_next.html")]
pub struct RegisterNextTemplate {
    pub mobile: String,
    pub nickname: String,
    pub error: Option<String>,
}

/// Registration finished.
#[derive(Template, WebTemplate)]
#[template(path = "user/register_result.html")]
pub struct RegisterResultTemplate {
    pub username: String,
    pub nickname: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "user/profile.html")]
pub struct ProfileTemplate {
    pub account: CurrentAccount,
    pub user: User,
}

#[derive(Template, WebTemplate)]
#[template(path = "user/collection.html")]
pub struct CollectionTemplate {
    pub account: CurrentAccount,
    pub page: Page<CollectionEntry>,
}

#[derive(Template, WebTemplate)]
#[template(path = "user/orders.html")]
pub struct OrdersTemplate {
    pub account: CurrentAccount,
    pub orders: Vec<Order>,
}

/// A delivery address as listed.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: i32,
    pub full_address: String,
    pub mobile: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "user/addresses.html")]
pub struct AddressesTemplate {
    pub account: CurrentAccount,
    pub addresses: Vec<AddressView>,
    pub error: Option<String>,
}

// =============================================================================
// Registration wizard
// =============================================================================

fn identity_page(status: StatusCode, form: &RegisterForm, error: Option<String>) -> Response {
    (
        status,
        RegisterTemplate {
            mobile: form.mobile.clone(),
            email: form.email.clone(),
            error,
        },
    )
        .into_response()
}

async fn wizard_step(session: &Session) -> Result<Option<RegistrationStep>> {
    Ok(session.get(session_keys::USER_REGISTER).await?)
}

/// Show the current wizard step.
pub async fn register_page(session: Session, Query(query): Query<WizardQuery>) -> Result<Response> {
    if query.restart.is_some() {
        session
            .remove::<RegistrationStep>(session_keys::USER_REGISTER)
            .await?;
    }

    let step = wizard_step(&session).await?;
    Ok(match route(step.as_ref(), false, None) {
        WizardAction::ShowDetails(mobile) => RegisterNextTemplate {
            mobile: mobile.masked(),
            nickname: String::new(),
            error: None,
        }
        .into_response(),
        _ => identity_page(StatusCode::OK, &RegisterForm::default(), None),
    })
}

/// Advance the wizard.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<WizardQuery>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let step = wizard_step(&session).await?;
    let action = route(
        step.as_ref(),
        true,
        WizardForm::from_query(query.form.as_deref()),
    );
    let auth = AuthService::new(state.pool());

    match action {
        WizardAction::ShowIdentity | WizardAction::ShowDetails(_) => {
            Ok(identity_page(StatusCode::OK, &form, None))
        }
        WizardAction::SubmitMobile => {
            match auth.check_mobile_available(AccountKind::User, &form.mobile).await {
                Ok(mobile) => {
                    session
                        .insert(session_keys::USER_REGISTER, RegistrationStep::Details { mobile })
                        .await?;
                    Ok(Redirect::to("/user/register").into_response())
                }
                Err(err) if err.is_user_facing() => Ok(identity_page(
                    StatusCode::BAD_REQUEST,
                    &form,
                    Some(user_message(&err)),
                )),
                Err(err) => Err(err.into()),
            }
        }
        WizardAction::SubmitEmail => {
            match send_activation(&state, &form.email, &form.password).await {
                Ok(()) => Ok(MessageTemplate::new(
                    "Check your inbox",
                    format!("We sent an activation link to {}.", form.email.trim()),
                )
                .into_response()),
                Err(AppError::Auth(err)) if err.is_user_facing() => Ok(identity_page(
                    StatusCode::BAD_REQUEST,
                    &form,
                    Some(user_message(&err)),
                )),
                Err(err) => Err(err),
            }
        }
        WizardAction::SubmitDetails(mobile) => finish_registration(&state, &session, &mobile, form).await,
    }
}

async fn finish_registration(
    state: &AppState,
    session: &Session,
    mobile: &Mobile,
    form: RegisterForm,
) -> Result<Response> {
    let nickname = form
        .nickname
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty());
    let details = UserDetails {
        password: form.password,
        confirm: form.confirm,
        nickname: nickname.clone(),
    };

    match AuthService::new(state.pool())
        .register_user_with_mobile(mobile, &details)
        .await
    {
        Ok(user) => {
            session
                .remove::<RegistrationStep>(session_keys::USER_REGISTER)
                .await?;
            set_current_account(session, &CurrentAccount::of(&user)).await?;
            tracing::info!(user_id = %user.id, "Buyer registered with mobile");
            Ok(RegisterResultTemplate {
                username: user.username,
                nickname,
            }
            .into_response())
        }
        Err(err @ AuthError::MobileTaken) => {
            session
                .remove::<RegistrationStep>(session_keys::USER_REGISTER)
                .await?;
            Ok(identity_page(
                StatusCode::CONFLICT,
                &RegisterForm::default(),
                Some(user_message(&err)),
            ))
        }
        Err(err) if err.is_user_facing() => Ok((
            StatusCode::BAD_REQUEST,
            RegisterNextTemplate {
                mobile: mobile.masked(),
                nickname: nickname.unwrap_or_default(),
                error: Some(user_message(&err)),
            },
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

/// Validate an email registration and mail the activation link.
async fn send_activation(state: &AppState, email: &str, password: &str) -> Result<()> {
    let pending = AuthService::new(state.pool())
        .prepare_email_registration(email, password)
        .await?;
    let token = state.confirm_tokens().issue(&pending).await?;
    let link = confirm_link(&state.config().base_url, &token, ConfirmAction::Register);
    deliver_confirmation(state.email(), &pending.email, &link, ConfirmAction::Register).await?;
    Ok(())
}

/// Start an email registration from a script: `ok` when the link was sent,
/// `false` with 401 when the email or password is refused.
#[instrument(skip(state, form))]
pub async fn reg_email(
    State(state): State<AppState>,
    Form(form): Form<RegEmailForm>,
) -> Result<Response> {
    match send_activation(&state, &form.email, &form.password).await {
        Ok(()) => Ok("ok".into_response()),
        Err(AppError::Auth(err)) if err.is_user_facing() => {
            tracing::info!(error = %err, "Email registration refused");
            Ok((StatusCode::UNAUTHORIZED, "false").into_response())
        }
        Err(err) => Err(err),
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Display the buyer's profile.
pub async fn profile(
    State(state): State<AppState>,
    RequireUser(user_id, account): RequireUser,
) -> Result<ProfileTemplate> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(ProfileTemplate { account, user })
}

// =============================================================================
// Wishlist
// =============================================================================

/// Display a page of the wishlist.
pub async fn collection(
    State(state): State<AppState>,
    RequireUser(user_id, account): RequireUser,
    Query(query): Query<PageQuery>,
) -> Result<CollectionTemplate> {
    let page = CollectionRepository::new(state.pool())
        .list_for_user(user_id, PageRequest::new(query.page, COLLECTION_PAGE_SIZE))
        .await?;
    Ok(CollectionTemplate { account, page })
}

/// Save an item. Saving it twice is fine.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn save_item(
    State(state): State<AppState>,
    RequireUser(user_id, _): RequireUser,
    Form(form): Form<CollectionForm>,
) -> Result<&'static str> {
    let item_id = ItemId::new(form.item);
    let exists = ItemRepository::new(state.pool())
        .get_by_id(item_id)
        .await?
        .is_some_and(|item| !item.is_deleted);
    if !exists {
        return Err(AppError::NotFound(format!("item {item_id}")));
    }

    CollectionRepository::new(state.pool())
        .add(user_id, item_id)
        .await?;
    Ok("ok")
}

/// Unsave an item. Unsaving an item that was not saved is fine.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn unsave_item(
    State(state): State<AppState>,
    RequireUser(user_id, _): RequireUser,
    Form(form): Form<CollectionForm>,
) -> Result<&'static str> {
    CollectionRepository::new(state.pool())
        .remove(user_id, ItemId::new(form.item))
        .await?;
    Ok("ok")
}

// =============================================================================
// Orders and addresses
// =============================================================================

/// Display the buyer's orders.
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(user_id, account): RequireUser,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(OrdersTemplate { account, orders })
}

pub(crate) async fn address_views(state: &AppState, user_id: rosewood_core::UserId) -> Result<Vec<AddressView>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;

    let mut views = Vec::with_capacity(addresses.len());
    for mut address in addresses {
        views.push(AddressView {
            id: address.id.as_i32(),
            full_address: address.precise_address(state.pool()).await?,
            mobile: address.mobile.as_ref().map(Mobile::masked).unwrap_or_default(),
        });
    }
    Ok(views)
}

/// Display the buyer's delivery addresses.
pub async fn addresses(
    State(state): State<AppState>,
    RequireUser(user_id, account): RequireUser,
) -> Result<AddressesTemplate> {
    Ok(AddressesTemplate {
        account,
        addresses: address_views(&state, user_id).await?,
        error: None,
    })
}

/// Check a new address. Returns the message to show when it is refused.
async fn validate_address(
    state: &AppState,
    form: &AddressForm,
) -> Result<std::result::Result<(RegionCode, Mobile), &'static str>> {
    let Some(code) = RegionCode::parse(form.cn_id.trim()) else {
        return Ok(Err("Choose a region"));
    };
    if RegionRepository::new(state.pool())
        .area_for_code(code)
        .await?
        .is_none()
    {
        return Ok(Err("Choose a region"));
    }
    let street = form.address.trim();
    if street.is_empty() || street.chars().count() > MAX_ADDRESS_LEN {
        return Ok(Err("Enter a street address of at most 100 characters"));
    }
    let Ok(mobile) = Mobile::parse(&form.mobile) else {
        return Ok(Err("Invalid mobile number"));
    };
    Ok(Ok((code, mobile)))
}

/// Add a delivery address.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireUser(user_id, account): RequireUser,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match validate_address(&state, &form).await? {
        Ok((code, mobile)) => {
            AddressRepository::new(state.pool())
                .create_for_user(user_id, code, form.address.trim(), &mobile)
                .await?;
            Ok(Redirect::to("/user/addresses").into_response())
        }
        Err(message) => Ok((
            StatusCode::BAD_REQUEST,
            AddressesTemplate {
                account,
                addresses: address_views(&state, user_id).await?,
                error: Some(message.to_owned()),
            },
        )
            .into_response()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_result_shows_names() {
        let html = RegisterResultTemplate {
            username: "用户123456".to_string(),
            nickname: Some("阿木".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("用户123456"));
        assert!(html.contains("阿木"));
    }

    #[test]
    fn test_identity_page_keeps_input() {
        let html = RegisterTemplate {
            mobile: "1380013".to_string(),
            email: String::new(),
            error: Some("Invalid mobile number".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("value=\"1380013\""));
        assert!(html.contains("Invalid mobile number"));
        assert!(html.contains("/user/register?form=email"));
    }
}
