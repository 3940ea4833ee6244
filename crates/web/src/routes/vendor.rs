//! Vendor pages: registration wizard, dashboard, verification resubmission,
//! items and distributors.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use rosewood_core::{
    AccountKind, DistributorId, ItemId, Mobile, RemindStatus, RevocationState,
    VerificationStatus, VendorId,
};

use crate::db::{
    DistributorRepository, ItemRepository, Page, PageRequest, ReferenceRepository,
    RepositoryError, RevocationRepository, VendorRepository,
};
use crate::error::{AppError, Result, user_message};
use crate::middleware::{RequireVendor, set_current_account};
use crate::models::{
    Choice, CurrentAccount, Distributor, Item, ItemFormOptions, RegistrationStep, Reminds, Vendor,
    VendorStatistics, session_keys,
};
use crate::services::auth::{AuthError, AuthService, DistributorDetails, ReconfirmDetails, VendorDetails};
use crate::services::catalogue::ItemForm;
use crate::services::registration::{WizardAction, WizardForm, route};
use crate::state::AppState;

/// Item listing page size.
pub const ITEMS_PAGE_SIZE: u32 = 100;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WizardQuery {
    pub form: Option<String>,
    pub restart: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Every field the vendor wizard may post.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub mobile: String,
    pub password: String,
    pub confirm: String,
    pub email: String,
    pub agent_name: String,
    pub agent_identity: String,
    pub name: String,
    pub license_limit: String,
    pub telephone: String,
    pub cn_id: String,
    pub address: String,
}

impl RegisterForm {
    fn details(&self) -> VendorDetails {
        VendorDetails {
            password: self.password.clone(),
            confirm: self.confirm.clone(),
            email: self.email.clone(),
            agent_name: self.agent_name.clone(),
            agent_identity: self.agent_identity.clone(),
            name: self.name.clone(),
            license_limit: self.license_limit.clone(),
            telephone: self.telephone.clone(),
            cn_id: parse_cn_id(&self.cn_id),
            address: self.address.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReconfirmForm {
    pub agent_name: String,
    pub agent_identity: String,
    pub agent_identity_front: String,
    pub agent_identity_back: String,
    pub license_limit: String,
    pub license_image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DistributorForm {
    pub password: String,
    pub confirm: String,
    pub name: String,
    pub contact: String,
    pub contact_telephone: String,
    pub contact_mobile: String,
    pub cn_id: String,
    pub address: String,
}

/// Revocation filing: the stored path of the signed termination contract.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevokeForm {
    pub contract: String,
}

/// Region selects post strings; anything unparsable is the invalid code 0.
fn parse_cn_id(raw: &str) -> i32 {
    raw.trim().parse().unwrap_or(0)
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "vendor/register.html")]
pub struct RegisterTemplate {
    pub mobile: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/register_next.html")]
pub struct RegisterNextTemplate {
    pub mobile: String,
    pub form: RegisterForm,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/profile.html")]
pub struct ProfileTemplate {
    pub account: CurrentAccount,
    pub vendor: Vendor,
    pub status: VerificationStatus,
    pub address: String,
    pub logo_url: Option<String>,
    pub statistics: VendorStatistics,
    pub reminds: Reminds,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/reconfirm.html")]
pub struct ReconfirmTemplate {
    pub account: CurrentAccount,
    pub form: ReconfirmForm,
    pub reject_message: String,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/items.html")]
pub struct ItemsTemplate {
    pub account: CurrentAccount,
    pub page: Page<Item>,
    pub item_permission: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/item_new.html")]
pub struct NewItemTemplate {
    pub account: CurrentAccount,
    pub options: ItemFormOptions,
    pub form: ItemForm,
    pub error: Option<String>,
}

/// One select of the item form.
pub struct SelectField<'a> {
    pub name: &'static str,
    pub label: &'static str,
    pub choices: &'a [Choice],
    pub current: &'a str,
}

impl SelectField<'_> {
    #[must_use]
    pub fn is_selected(&self, id: &i32) -> bool {
        self.current.trim().parse() == Ok(*id)
    }
}

impl NewItemTemplate {
    /// The single-choice selects, in form order.
    #[must_use]
    pub fn selects(&self) -> Vec<SelectField<'_>> {
        let (o, f) = (&self.options, &self.form);
        [
            ("material", "Material", &o.materials, &f.material),
            ("second_category", "Category", &o.second_categories, &f.second_category),
            ("second_scene", "Scene", &o.second_scenes, &f.second_scene),
            ("style", "Style", &o.styles, &f.style),
            ("stove", "Drying", &o.stoves, &f.stove),
            ("carve", "Carving", &o.carves, &f.carve),
            ("sand", "Sanding", &o.sands, &f.sand),
            ("paint", "Finish", &o.paints, &f.paint),
            ("decoration", "Decoration", &o.decorations, &f.decoration),
        ]
        .into_iter()
        .map(|(name, label, choices, current)| SelectField {
            name,
            label,
            choices,
            current,
        })
        .collect()
    }
}

/// A distributor row with its revocation state.
#[derive(Debug, Clone)]
pub struct DistributorRow {
    pub distributor: Distributor,
    pub revocation: RevocationState,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/distributors.html")]
pub struct DistributorsTemplate {
    pub account: CurrentAccount,
    pub distributors: Vec<DistributorRow>,
    pub form: DistributorForm,
    pub error: Option<String>,
    /// Username of the distributor just created.
    pub created: Option<String>,
}

// =============================================================================
// Registration wizard
// =============================================================================

fn identity_page(status: StatusCode, mobile: &str, error: Option<String>) -> Response {
    (
        status,
        RegisterTemplate {
            mobile: mobile.to_owned(),
            error,
        },
    )
        .into_response()
}

/// Show the current wizard step.
pub async fn register_page(session: Session, Query(query): Query<WizardQuery>) -> Result<Response> {
    if query.restart.is_some() {
        session
            .remove::<RegistrationStep>(session_keys::VENDOR_REGISTER)
            .await?;
    }

    let step: Option<RegistrationStep> = session.get(session_keys::VENDOR_REGISTER).await?;
    Ok(match route(step.as_ref(), false, None) {
        WizardAction::ShowDetails(mobile) => RegisterNextTemplate {
            mobile: mobile.masked(),
            form: RegisterForm::default(),
            error: None,
        }
        .into_response(),
        _ => identity_page(StatusCode::OK, "", None),
    })
}

/// Advance the wizard. Vendors register with a mobile only.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<WizardQuery>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let step: Option<RegistrationStep> = session.get(session_keys::VENDOR_REGISTER).await?;
    let form_kind = WizardForm::from_query(query.form.as_deref()).filter(|f| *f == WizardForm::Mobile);

    match route(step.as_ref(), true, form_kind) {
        WizardAction::SubmitMobile => {
            match AuthService::new(state.pool())
                .check_mobile_available(AccountKind::Vendor, &form.mobile)
                .await
            {
                Ok(mobile) => {
                    session
                        .insert(session_keys::VENDOR_REGISTER, RegistrationStep::Details { mobile })
                        .await?;
                    Ok(Redirect::to("/vendor/register").into_response())
                }
                Err(err) if err.is_user_facing() => Ok(identity_page(
                    StatusCode::BAD_REQUEST,
                    &form.mobile,
                    Some(user_message(&err)),
                )),
                Err(err) => Err(err.into()),
            }
        }
        WizardAction::SubmitDetails(mobile) => finish_registration(&state, &session, &mobile, form).await,
        _ => Ok(identity_page(StatusCode::OK, &form.mobile, None)),
    }
}

async fn finish_registration(
    state: &AppState,
    session: &Session,
    mobile: &Mobile,
    form: RegisterForm,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .register_vendor(mobile, &form.details())
        .await
    {
        Ok(vendor) => {
            session
                .remove::<RegistrationStep>(session_keys::VENDOR_REGISTER)
                .await?;
            set_current_account(session, &CurrentAccount::of(&vendor)).await?;
            state
                .reminds()
                .push_vendor_confirm(vendor.id, RemindStatus::Warning, "")
                .await?;
            Ok(Redirect::to("/vendor/profile").into_response())
        }
        Err(err @ AuthError::MobileTaken) => {
            session
                .remove::<RegistrationStep>(session_keys::VENDOR_REGISTER)
                .await?;
            Ok(identity_page(StatusCode::CONFLICT, "", Some(user_message(&err))))
        }
        Err(err) if err.is_user_facing() => {
            let status = if matches!(err, AuthError::EmailTaken | AuthError::NameTaken(_)) {
                StatusCode::CONFLICT
            } else {
                StatusCode::BAD_REQUEST
            };
            let form = RegisterForm {
                password: String::new(),
                confirm: String::new(),
                ..form
            };
            Ok((
                status,
                RegisterNextTemplate {
                    mobile: mobile.masked(),
                    form,
                    error: Some(user_message(&err)),
                },
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// Dashboard and verification
// =============================================================================

async fn load_vendor(state: &AppState, vendor_id: VendorId) -> Result<Vendor> {
    VendorRepository::new(state.pool())
        .get_by_id(vendor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("vendor {vendor_id}")))
}

/// Display the dashboard with reminds and statistics.
pub async fn profile(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
) -> Result<ProfileTemplate> {
    let mut vendor = load_vendor(&state, vendor_id).await?;

    let address = match vendor.address(state.pool()).await? {
        Some(address) => address.precise_address(state.pool()).await?,
        None => String::new(),
    };
    let logo_url = vendor.logo_url(state.media_base()).map(str::to_owned);
    let statistics = vendor.statistics(state.pool()).await?;
    let reminds = state.reminds().vendor_reminds(vendor_id).await?;

    Ok(ProfileTemplate {
        account,
        status: vendor.verification_status(),
        vendor,
        address,
        logo_url,
        statistics,
        reminds,
    })
}

/// Show the resubmission form, prefilled with the current agent data.
pub async fn reconfirm_page(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
) -> Result<ReconfirmTemplate> {
    let vendor = load_vendor(&state, vendor_id).await?;
    Ok(ReconfirmTemplate {
        account,
        reject_message: vendor.reject_message.clone(),
        form: ReconfirmForm {
            agent_name: vendor.agent_name,
            agent_identity: vendor.agent_identity,
            agent_identity_front: vendor.agent_identity_front,
            agent_identity_back: vendor.agent_identity_back,
            license_limit: vendor.license_limit,
            license_image: vendor.license_image,
        },
        error: None,
    })
}

/// Resubmit agent data after a rejection.
#[instrument(skip_all, fields(vendor_id = %vendor_id))]
pub async fn reconfirm(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
    Form(form): Form<ReconfirmForm>,
) -> Result<Response> {
    let vendor = load_vendor(&state, vendor_id).await?;
    if vendor.verification_status() == VerificationStatus::Confirmed {
        return Ok(Redirect::to("/vendor/profile").into_response());
    }

    let details = ReconfirmDetails {
        agent_name: form.agent_name.clone(),
        agent_identity: form.agent_identity.clone(),
        agent_identity_front: form.agent_identity_front.clone(),
        agent_identity_back: form.agent_identity_back.clone(),
        license_limit: form.license_limit.clone(),
        license_image: form.license_image.clone(),
    };
    match AuthService::new(state.pool())
        .reconfirm_vendor(vendor_id, &details)
        .await
    {
        Ok(_) => {
            state
                .reminds()
                .push_vendor_confirm(vendor_id, RemindStatus::Warning, "")
                .await?;
            Ok(Redirect::to("/vendor/profile").into_response())
        }
        Err(err) if err.is_user_facing() => Ok((
            StatusCode::BAD_REQUEST,
            ReconfirmTemplate {
                account,
                reject_message: vendor.reject_message,
                form,
                error: Some(user_message(&err)),
            },
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// Items
// =============================================================================

/// List the vendor's live items.
pub async fn items(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
    Query(query): Query<PageQuery>,
) -> Result<ItemsTemplate> {
    let vendor = load_vendor(&state, vendor_id).await?;
    let page = ItemRepository::new(state.pool())
        .list_for_vendor(vendor_id, PageRequest::new(query.page, ITEMS_PAGE_SIZE))
        .await?;
    Ok(ItemsTemplate {
        account,
        page,
        item_permission: vendor.item_permission,
    })
}

async fn require_item_permission(state: &AppState, vendor_id: VendorId) -> Result<()> {
    if load_vendor(state, vendor_id).await?.item_permission {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "items can be listed once the vendor is verified".to_string(),
        ))
    }
}

/// Show the new item form.
pub async fn new_item_page(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
) -> Result<NewItemTemplate> {
    require_item_permission(&state, vendor_id).await?;
    let options = ReferenceRepository::new(state.pool())
        .item_form_options()
        .await?;
    Ok(NewItemTemplate {
        account,
        options,
        form: ItemForm::default(),
        error: None,
    })
}

/// List a new item.
#[instrument(skip_all, fields(vendor_id = %vendor_id))]
pub async fn create_item(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    require_item_permission(&state, vendor_id).await?;
    let options = ReferenceRepository::new(state.pool())
        .item_form_options()
        .await?;
    let form = ItemForm::from_pairs(pairs);

    match form.validate(vendor_id, &options) {
        Ok(new_item) => {
            let item = ItemRepository::new(state.pool()).create(&new_item).await?;
            tracing::info!(item_id = %item.id, "Item listed");
            Ok(Redirect::to(&format!("/items/{}", item.id)).into_response())
        }
        Err(err) => Ok((
            StatusCode::BAD_REQUEST,
            NewItemTemplate {
                account,
                options,
                form,
                error: Some(err.to_string()),
            },
        )
            .into_response()),
    }
}

/// Soft-delete one of the vendor's items.
#[instrument(skip_all, fields(vendor_id = %vendor_id, item_id = id))]
pub async fn delete_item(
    State(state): State<AppState>,
    RequireVendor(vendor_id, _): RequireVendor,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    ItemRepository::new(state.pool())
        .soft_delete(vendor_id, ItemId::new(id))
        .await?;
    Ok(Redirect::to("/vendor/items"))
}

// =============================================================================
// Distributors
// =============================================================================

async fn distributors_page(
    state: &AppState,
    vendor_id: VendorId,
    account: CurrentAccount,
    form: DistributorForm,
    error: Option<String>,
    created: Option<String>,
) -> Result<DistributorsTemplate> {
    let list = DistributorRepository::new(state.pool())
        .list_for_vendor(vendor_id)
        .await?;

    let mut distributors = Vec::with_capacity(list.len());
    for mut distributor in list {
        let revocation = distributor.revocation_state(state.pool()).await?;
        distributors.push(DistributorRow {
            distributor,
            revocation,
        });
    }

    Ok(DistributorsTemplate {
        account,
        distributors,
        form,
        error,
        created,
    })
}

/// List the vendor's distributors with the creation form.
pub async fn distributors(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
) -> Result<DistributorsTemplate> {
    distributors_page(&state, vendor_id, account, DistributorForm::default(), None, None).await
}

/// Create a distributor with a generated username.
#[instrument(skip_all, fields(vendor_id = %vendor_id))]
pub async fn create_distributor(
    State(state): State<AppState>,
    RequireVendor(vendor_id, account): RequireVendor,
    Form(form): Form<DistributorForm>,
) -> Result<Response> {
    let details = DistributorDetails {
        password: form.password.clone(),
        confirm: form.confirm.clone(),
        name: form.name.clone(),
        contact: form.contact.clone(),
        contact_telephone: form.contact_telephone.clone(),
        contact_mobile: form.contact_mobile.clone(),
        cn_id: parse_cn_id(&form.cn_id),
        address: form.address.clone(),
    };

    match AuthService::new(state.pool())
        .create_distributor(vendor_id, &details)
        .await
    {
        Ok(distributor) => {
            state
                .reminds()
                .push_distributor_register(distributor.id, &distributor.username)
                .await?;
            let page = distributors_page(
                &state,
                vendor_id,
                account,
                DistributorForm::default(),
                None,
                Some(distributor.username),
            )
            .await?;
            Ok(page.into_response())
        }
        Err(err) if err.is_user_facing() => {
            let form = DistributorForm {
                password: String::new(),
                confirm: String::new(),
                ..form
            };
            let page = distributors_page(
                &state,
                vendor_id,
                account,
                form,
                Some(user_message(&err)),
                None,
            )
            .await?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// File a revocation for one of the vendor's distributors.
#[instrument(skip_all, fields(vendor_id = %vendor_id, distributor_id = id))]
pub async fn revoke_distributor(
    State(state): State<AppState>,
    RequireVendor(vendor_id, _): RequireVendor,
    Path(id): Path<i32>,
    Form(form): Form<RevokeForm>,
) -> Result<Redirect> {
    let distributor_id = DistributorId::new(id);
    let distributor = DistributorRepository::new(state.pool())
        .get_by_id(distributor_id)
        .await?
        .filter(|d| d.vendor_id == vendor_id)
        .ok_or_else(|| AppError::NotFound(format!("distributor {distributor_id}")))?;

    file_revocation(&state, distributor.id, &form.contract).await?;
    Ok(Redirect::to("/vendor/distributors"))
}

/// File a revocation with the contract photo path.
///
/// # Errors
///
/// Returns `AppError::BadRequest` without a contract and
/// `AppError::Database` with a conflict when one is already pending or the
/// distributor is revoked.
pub async fn file_revocation(state: &AppState, distributor_id: DistributorId, contract: &str) -> Result<()> {
    let contract = contract.trim();
    if contract.is_empty() {
        return Err(AppError::BadRequest("contract is required".to_string()));
    }
    let revocation = RevocationRepository::new(state.pool())
        .create(distributor_id, contract)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Database(RepositoryError::Conflict(
                "a revocation is already pending or approved".to_string(),
            )),
            other => other.into(),
        })?;
    tracing::info!(revocation_id = %revocation.id, "Revocation filed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rosewood_core::AccountId;

    use super::*;

    #[test]
    fn test_parse_cn_id() {
        assert_eq!(parse_cn_id(" 110101 "), 110_101);
        assert_eq!(parse_cn_id(""), 0);
        assert_eq!(parse_cn_id("abc"), 0);
    }

    #[test]
    fn test_details_carry_form() {
        let form = RegisterForm {
            email: "shop@example.com".to_string(),
            cn_id: "330782".to_string(),
            ..RegisterForm::default()
        };
        let details = form.details();
        assert_eq!(details.email, "shop@example.com");
        assert_eq!(details.cn_id, 330_782);
    }

    #[test]
    fn test_select_marks_posted_choice() {
        let choices = vec![Choice {
            id: 3,
            name: "明式".to_string(),
        }];
        let select = SelectField {
            name: "style",
            label: "Style",
            choices: &choices,
            current: " 3",
        };
        assert!(select.is_selected(&3));
        assert!(!select.is_selected(&4));
    }

    #[test]
    fn test_item_form_keeps_posted_choices() {
        let choice = |id: i32, name: &str| Choice {
            id,
            name: name.to_string(),
        };
        let options = ItemFormOptions {
            styles: vec![choice(3, "明式"), choice(4, "清式")],
            tenons: vec![choice(10, "燕尾榫"), choice(11, "抱肩榫")],
            ..ItemFormOptions::default()
        };
        let form = ItemForm::from_pairs(vec![
            ("style".to_string(), "4".to_string()),
            ("tenon".to_string(), "11".to_string()),
        ]);
        let html = NewItemTemplate {
            account: CurrentAccount {
                id: AccountId::new(AccountKind::Vendor, 7),
                name: "红木坊".to_string(),
            },
            options,
            form,
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"<option value="4" selected>清式</option>"#));
        assert!(html.contains(r#"<option value="3">明式</option>"#));
        assert!(html.contains(r#"value="11" checked>"#));
        assert!(!html.contains(r#"value="10" checked>"#));
    }

    #[test]
    fn test_register_page_has_mobile_form() {
        let html = RegisterTemplate {
            mobile: String::new(),
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("/vendor/register?form=mobile"));
    }
}
