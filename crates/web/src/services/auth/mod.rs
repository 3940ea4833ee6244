//! Authentication service.
//!
//! Password login for the four account kinds, buyer and vendor registration,
//! distributor creation by vendors and emailed password resets.
//!
//! Every kind has its own table and its own login identifiers:
//!
//! | Kind        | Logs in with               |
//! |-------------|----------------------------|
//! | User        | mobile, email or username  |
//! | Vendor      | mobile or email            |
//! | Distributor | username                   |
//! | Privilege   | username or email          |
//!
//! A missing account and a wrong password both produce
//! [`AuthError::InvalidCredentials`].

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sqlx::PgPool;

use rosewood_core::region::RegionCode;
use rosewood_core::{AccountKind, ConfirmAction, Email, Mobile, VendorId};

use crate::db::{
    DistributorRepository, NewDistributor, NewUser, NewVendor, PrivilegeRepository,
    RegionRepository, RepositoryError, UserRepository, VendorReconfirmation, VendorRepository,
};
use crate::models::{CurrentAccount, Distributor, PasswordResetGrant, Privilege, User, Vendor};
use crate::services::tokens::PendingConfirmation;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (argon2 input is bounded to keep hashing cheap).
const MAX_PASSWORD_LENGTH: usize = 128;

/// Prefix of generated buyer usernames.
pub const USER_USERNAME_PREFIX: &str = "用户";

/// Attempts made to find a free distributor username.
const DISTRIBUTOR_USERNAME_ATTEMPTS: usize = 10;

/// Detail form submitted at step 1 of buyer registration.
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub password: String,
    pub confirm: String,
    /// Becomes the username when given; otherwise one is generated.
    pub nickname: Option<String>,
}

/// Detail form submitted at step 1 of vendor registration.
#[derive(Debug, Clone)]
pub struct VendorDetails {
    pub password: String,
    pub confirm: String,
    pub email: String,
    pub agent_name: String,
    pub agent_identity: String,
    pub name: String,
    pub license_limit: String,
    pub telephone: String,
    pub cn_id: i32,
    pub address: String,
}

/// Agent data a rejected vendor resubmits. Photo fields hold stored paths.
#[derive(Debug, Clone, Default)]
pub struct ReconfirmDetails {
    pub agent_name: String,
    pub agent_identity: String,
    pub agent_identity_front: String,
    pub agent_identity_back: String,
    pub license_limit: String,
    pub license_image: String,
}

/// Form a vendor fills in to create a distributor.
#[derive(Debug, Clone)]
pub struct DistributorDetails {
    pub password: String,
    pub confirm: String,
    pub name: String,
    pub contact: String,
    pub contact_telephone: String,
    pub contact_mobile: String,
    pub cn_id: i32,
    pub address: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log in as an account of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the account does not exist or
    /// the password is wrong, and `AuthError::AccountRevoked` for a revoked
    /// distributor.
    pub async fn login(
        &self,
        kind: AccountKind,
        login: &str,
        password: &str,
    ) -> Result<CurrentAccount, AuthError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let account = match kind {
            AccountKind::User => {
                let (user, hash) = UserRepository::new(self.pool)
                    .get_by_login(login)
                    .await?
                    .ok_or_else(|| missing_account(password))?;
                verify_password(password, &hash)?;
                CurrentAccount::of(&user)
            }
            AccountKind::Vendor => {
                let (vendor, hash) = VendorRepository::new(self.pool)
                    .get_by_login(login)
                    .await?
                    .ok_or_else(|| missing_account(password))?;
                verify_password(password, &hash)?;
                CurrentAccount::of(&vendor)
            }
            AccountKind::Distributor => {
                let (distributor, hash) = DistributorRepository::new(self.pool)
                    .get_by_login(login)
                    .await?
                    .ok_or_else(|| missing_account(password))?;
                verify_password(password, &hash)?;
                if distributor.is_revoked {
                    return Err(AuthError::AccountRevoked);
                }
                CurrentAccount::of(&distributor)
            }
            AccountKind::Privilege => {
                let (privilege, hash) = PrivilegeRepository::new(self.pool)
                    .get_by_login(login)
                    .await?
                    .ok_or_else(|| missing_account(password))?;
                verify_password(password, &hash)?;
                CurrentAccount::of(&privilege)
            }
        };

        tracing::info!(account = %account.id, "Login succeeded");
        Ok(account)
    }

    // =========================================================================
    // Buyer registration
    // =========================================================================

    /// Check that a mobile number may start a registration of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidMobile` or `AuthError::MobileTaken`.
    pub async fn check_mobile_available(
        &self,
        kind: AccountKind,
        mobile: &str,
    ) -> Result<Mobile, AuthError> {
        let mobile = Mobile::parse(mobile)?;
        let taken = match kind {
            AccountKind::Vendor => VendorRepository::new(self.pool).mobile_exists(&mobile).await?,
            _ => UserRepository::new(self.pool).mobile_exists(&mobile).await?,
        };
        if taken {
            return Err(AuthError::MobileTaken);
        }
        Ok(mobile)
    }

    /// Create a buyer for the mobile accepted at step 0.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the detail form, or
    /// `AuthError::MobileTaken` if the number was registered meanwhile.
    pub async fn register_user_with_mobile(
        &self,
        mobile: &Mobile,
        details: &UserDetails,
    ) -> Result<User, AuthError> {
        validate_new_password(&details.password, &details.confirm)?;
        let users = UserRepository::new(self.pool);

        let nickname = details.nickname.as_deref().map(str::trim).unwrap_or_default();
        check_length("nickname", nickname, 20)?;

        let new_user = NewUser {
            username: self.generate_user_username().await?,
            nickname: nickname.to_owned(),
            mobile: Some(mobile.clone()),
            email: None,
            email_confirmed: false,
            password_hash: hash_password(&details.password)?,
        };
        let user = users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::MobileTaken,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Buyer registered with mobile");
        Ok(user)
    }

    /// Validate an email registration and build the confirmation to store
    /// until the emailed link is followed. Only the password hash is kept.
    ///
    /// # Errors
    ///
    /// Returns a validation error or `AuthError::EmailTaken`.
    pub async fn prepare_email_registration(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PendingConfirmation, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        if UserRepository::new(self.pool).email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        Ok(PendingConfirmation {
            action: ConfirmAction::Register,
            kind: AccountKind::User,
            email,
            password_hash: Some(hash_password(password)?),
        })
    }

    /// Create the buyer for a redeemed registration link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the address was registered after
    /// the link was sent, or `AuthError::InvalidCredentials` if the
    /// confirmation carries no password.
    pub async fn activate_email_registration(
        &self,
        pending: &PendingConfirmation,
    ) -> Result<User, AuthError> {
        let password_hash = pending
            .password_hash
            .clone()
            .ok_or(AuthError::InvalidCredentials)?;

        let new_user = NewUser {
            username: self.generate_user_username().await?,
            nickname: String::new(),
            mobile: None,
            email: Some(pending.email.clone()),
            email_confirmed: true,
            password_hash,
        };
        let user = UserRepository::new(self.pool)
            .create(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Buyer activated by email");
        Ok(user)
    }

    /// `用户` followed by six random digits, retried until unused.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn generate_user_username(&self) -> Result<String, AuthError> {
        let users = UserRepository::new(self.pool);
        loop {
            let candidate = random_user_username();
            if !users.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
    }

    // =========================================================================
    // Vendors and distributors
    // =========================================================================

    /// Create a vendor and its address for the mobile accepted at step 0.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the detail form or a `*Taken` error for
    /// a mobile, email or brand name already in use.
    pub async fn register_vendor(
        &self,
        mobile: &Mobile,
        details: &VendorDetails,
    ) -> Result<Vendor, AuthError> {
        validate_new_password(&details.password, &details.confirm)?;
        let email = Email::parse(&details.email)?;
        let agent_name = required("agent name", &details.agent_name, 10)?;
        let agent_identity = validate_identity_number(&details.agent_identity)?;
        let name = required("brand name", &details.name, 30)?;
        let license_limit = validate_license_limit(&details.license_limit)?;
        let telephone = required("telephone", &details.telephone, 15)?;
        let cn_id = self.known_region(details.cn_id).await?;
        let address = required("address", &details.address, 30)?;

        let vendors = VendorRepository::new(self.pool);
        if vendors.mobile_exists(mobile).await? {
            return Err(AuthError::MobileTaken);
        }
        if vendors.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }
        if vendors.name_exists(name).await? {
            return Err(AuthError::NameTaken("brand name"));
        }

        let new_vendor = NewVendor {
            password_hash: hash_password(&details.password)?,
            mobile: mobile.clone(),
            email,
            agent_name: agent_name.to_owned(),
            agent_identity,
            name: name.to_owned(),
            license_limit,
            contact: agent_name.to_owned(),
            telephone: telephone.to_owned(),
            introduction: String::new(),
            cn_id,
            address: address.to_owned(),
        };
        let vendor = vendors.create(&new_vendor).await.map_err(|e| match e {
            RepositoryError::Conflict(what) => conflict_to_auth(&what),
            other => AuthError::Repository(other),
        })?;

        tracing::info!(vendor_id = %vendor.id, "Vendor registered");
        Ok(vendor)
    }

    /// Store agent data resubmitted after a rejection and put the vendor
    /// back in the review queue.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the form or `AuthError::AccountNotFound`.
    pub async fn reconfirm_vendor(
        &self,
        vendor_id: VendorId,
        details: &ReconfirmDetails,
    ) -> Result<Vendor, AuthError> {
        let data = VendorReconfirmation {
            agent_name: required("agent name", &details.agent_name, 10)?.to_owned(),
            agent_identity: validate_identity_number(&details.agent_identity)?,
            agent_identity_front: optional("identity photo", &details.agent_identity_front, 200)?
                .to_owned(),
            agent_identity_back: optional("identity photo", &details.agent_identity_back, 200)?
                .to_owned(),
            license_limit: validate_license_limit(&details.license_limit)?,
            license_image: optional("license photo", &details.license_image, 200)?.to_owned(),
        };

        let vendor = VendorRepository::new(self.pool)
            .reconfirm(vendor_id, &data)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::AccountNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(vendor_id = %vendor_id, "Vendor resubmitted for review");
        Ok(vendor)
    }

    /// Create a distributor for `vendor_id` with a generated username.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the form or
    /// `AuthError::UsernameExhausted` if no free username was found.
    pub async fn create_distributor(
        &self,
        vendor_id: VendorId,
        details: &DistributorDetails,
    ) -> Result<Distributor, AuthError> {
        validate_new_password(&details.password, &details.confirm)?;
        let name = required("name", &details.name, 30)?;
        let contact = required("contact", &details.contact, 10)?;
        let contact_telephone = optional("contact telephone", &details.contact_telephone, 30)?;
        let contact_mobile = match details.contact_mobile.trim() {
            "" => String::new(),
            raw => Mobile::parse(raw)?.as_str().to_owned(),
        };
        let cn_id = self.known_region(details.cn_id).await?;
        let address = required("address", &details.address, 30)?;

        let new_distributor = NewDistributor {
            vendor_id,
            username: self.generate_distributor_username().await?,
            password_hash: hash_password(&details.password)?,
            name: name.to_owned(),
            contact: contact.to_owned(),
            contact_telephone: contact_telephone.to_owned(),
            contact_mobile,
            cn_id,
            address: address.to_owned(),
        };
        let distributor = DistributorRepository::new(self.pool)
            .create(&new_distributor)
            .await?;

        tracing::info!(
            vendor_id = %vendor_id,
            distributor_id = %distributor.id,
            "Distributor created"
        );
        Ok(distributor)
    }

    /// A well-formed region code that is present in the region tables.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidField` for a malformed or unknown code.
    pub async fn known_region(&self, cn_id: i32) -> Result<RegionCode, AuthError> {
        let code = region_code(cn_id)?;
        if RegionRepository::new(self.pool)
            .area_for_code(code)
            .await?
            .is_none()
        {
            return Err(unknown_region());
        }
        Ok(code)
    }

    /// Eight random digits, at most ten attempts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameExhausted` when every attempt was taken.
    pub async fn generate_distributor_username(&self) -> Result<String, AuthError> {
        let distributors = DistributorRepository::new(self.pool);
        for _ in 0..DISTRIBUTOR_USERNAME_ATTEMPTS {
            let candidate = random_distributor_username();
            if !distributors.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        tracing::error!("No free distributor username after {DISTRIBUTOR_USERNAME_ATTEMPTS} attempts");
        Err(AuthError::UsernameExhausted)
    }

    /// Create an administrator. Administrators are only made from the CLI.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the username, email or password, or
    /// `AuthError::NameTaken` if the username or email is already used.
    pub async fn create_privilege(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Privilege, AuthError> {
        let username = required("username", username, 30)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let privilege = PrivilegeRepository::new(self.pool)
            .create(username, &email, &hash_password(password)?)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::NameTaken("username or email"),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(privilege_id = %privilege.id, "Administrator created");
        Ok(privilege)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Build the confirmation for a reset link, if an account of `kind` has
    /// this email. Returns `None` for unknown addresses so callers can answer
    /// the same way either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or a repository error.
    pub async fn request_password_reset(
        &self,
        kind: AccountKind,
        email: &str,
    ) -> Result<Option<PendingConfirmation>, AuthError> {
        let email = Email::parse(email)?;
        let exists = match kind {
            AccountKind::User => UserRepository::new(self.pool)
                .get_by_email(&email)
                .await?
                .is_some(),
            AccountKind::Vendor => VendorRepository::new(self.pool)
                .get_by_email(&email)
                .await?
                .is_some(),
            AccountKind::Distributor | AccountKind::Privilege => false,
        };

        if !exists {
            tracing::debug!(kind = %kind, "Password reset requested for unknown email");
            return Ok(None);
        }

        Ok(Some(PendingConfirmation {
            action: ConfirmAction::ResetPassword,
            kind,
            email,
            password_hash: None,
        }))
    }

    /// Set a new password for the account a reset link was followed for.
    ///
    /// # Errors
    ///
    /// Returns a password validation error or `AuthError::AccountNotFound`.
    pub async fn reset_password(
        &self,
        grant: &PasswordResetGrant,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password, confirm)?;
        let hash = hash_password(password)?;

        match grant.kind {
            AccountKind::User => {
                let users = UserRepository::new(self.pool);
                let user = users
                    .get_by_email(&grant.email)
                    .await?
                    .ok_or(AuthError::AccountNotFound)?;
                users.update_password(user.id, &hash).await?;
            }
            AccountKind::Vendor => {
                let vendors = VendorRepository::new(self.pool);
                let vendor = vendors
                    .get_by_email(&grant.email)
                    .await?
                    .ok_or(AuthError::AccountNotFound)?;
                vendors.update_password(vendor.id, &hash).await?;
            }
            AccountKind::Distributor | AccountKind::Privilege => {
                return Err(AuthError::AccountNotFound);
            }
        }

        tracing::info!(kind = %grant.kind, "Password reset");
        Ok(())
    }
}

fn random_user_username() -> String {
    let digits: u32 = rand::rng().random_range(100_000..1_000_000);
    format!("{USER_USERNAME_PREFIX}{digits}")
}

fn random_distributor_username() -> String {
    let digits: u32 = rand::rng().random_range(10_000_000..100_000_000);
    digits.to_string()
}

/// Map a unique-violation description from the vendor insert.
fn conflict_to_auth(what: &str) -> AuthError {
    if what.contains("mobile") {
        AuthError::MobileTaken
    } else if what.contains("email") {
        AuthError::EmailTaken
    } else {
        AuthError::NameTaken("brand name")
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a new password and its confirmation.
fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    validate_password(password)?;
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), AuthError> {
    if value.chars().count() > max {
        return Err(AuthError::InvalidField {
            field,
            reason: "too long",
        });
    }
    Ok(())
}

/// A trimmed, non-empty field of at most `max` characters.
fn required<'v>(field: &'static str, value: &'v str, max: usize) -> Result<&'v str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::InvalidField {
            field,
            reason: "required",
        });
    }
    check_length(field, value, max)?;
    Ok(value)
}

/// A trimmed field of at most `max` characters, possibly empty.
fn optional<'v>(field: &'static str, value: &'v str, max: usize) -> Result<&'v str, AuthError> {
    let value = value.trim();
    check_length(field, value, max)?;
    Ok(value)
}

/// Eighteen characters: seventeen digits and a digit or `X` check character.
fn validate_identity_number(value: &str) -> Result<String, AuthError> {
    let value = value.trim().to_ascii_uppercase();
    let bytes = value.as_bytes();
    let valid = bytes.len() == 18
        && bytes.iter().take(17).all(u8::is_ascii_digit)
        && bytes
            .last()
            .is_some_and(|b| b.is_ascii_digit() || *b == b'X');
    if !valid {
        return Err(AuthError::InvalidField {
            field: "agent identity",
            reason: "must be an 18-character identity number",
        });
    }
    Ok(value)
}

/// License expiry as `YYYY/MM/DD` (dashes are accepted and normalized).
fn validate_license_limit(value: &str) -> Result<String, AuthError> {
    let value = value.trim().replace('-', "/");
    if chrono::NaiveDate::parse_from_str(&value, "%Y/%m/%d").is_err() || value.len() != 10 {
        return Err(AuthError::InvalidField {
            field: "license limit",
            reason: "must be a date like 2035/07/19",
        });
    }
    Ok(value)
}

const fn unknown_region() -> AuthError {
    AuthError::InvalidField {
        field: "region",
        reason: "unknown region code",
    }
}

fn region_code(cn_id: i32) -> Result<RegionCode, AuthError> {
    RegionCode::from_i32(cn_id).ok_or_else(unknown_region)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Hash checked when the login names no account, so a miss costs the same
/// Argon2 work as a wrong password.
static MISSING_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("rosewood-missing-account").ok());

/// The error for a login that names no account, after the same work as a
/// real password check.
fn missing_account(password: &str) -> AuthError {
    if let Some(hash) = MISSING_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_account_runs_a_password_check() {
        assert!(MISSING_ACCOUNT_HASH.as_deref().unwrap().starts_with("$argon2id$"));
        assert!(matches!(
            missing_account("rosewood-table"),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_malformed_region_is_refused_before_lookup() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://rosewood@localhost/rosewood_test")
            .unwrap();
        let auth = AuthService::new(&pool);
        assert!(matches!(
            auth.known_region(12).await,
            Err(AuthError::InvalidField { field: "region", .. })
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("rosewood-table").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("rosewood-table", &hash).is_ok());
        assert!(matches!(
            verify_password("rosewood-chair", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_rules() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("eight888").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
        assert!(matches!(
            validate_new_password("longenough", "longenougH"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_generated_usernames() {
        for _ in 0..50 {
            let user = random_user_username();
            let digits = user.strip_prefix(USER_USERNAME_PREFIX).unwrap();
            assert_eq!(digits.len(), 6);
            assert!(digits.bytes().all(|b| b.is_ascii_digit()));

            let distributor = random_distributor_username();
            assert_eq!(distributor.len(), 8);
            assert!(!distributor.starts_with('0'));
        }
    }

    #[test]
    fn test_identity_number() {
        assert_eq!(
            validate_identity_number("11010519491231002x").unwrap(),
            "11010519491231002X"
        );
        assert!(validate_identity_number("110105194912310021").is_ok());
        assert!(validate_identity_number("1101051949123100").is_err());
        assert!(validate_identity_number("11010519491231002Y").is_err());
    }

    #[test]
    fn test_license_limit() {
        assert_eq!(validate_license_limit("2035-07-19").unwrap(), "2035/07/19");
        assert!(validate_license_limit("2035/02/30").is_err());
        assert!(validate_license_limit("tomorrow").is_err());
    }

    #[test]
    fn test_field_helpers() {
        assert!(matches!(
            required("name", "   ", 30),
            Err(AuthError::InvalidField { field: "name", .. })
        ));
        assert_eq!(required("name", " 红木坊 ", 30).unwrap(), "红木坊");
        // Length counts characters, not bytes.
        assert!(required("agent name", "张三丰李四王五赵六", 10).is_ok());
        assert!(optional("contact telephone", "", 30).is_ok());
        assert!(region_code(320_102).is_ok());
        assert!(region_code(0).is_err());
    }

    #[test]
    fn test_conflict_mapping() {
        assert!(matches!(conflict_to_auth("vendors_mobile_key"), AuthError::MobileTaken));
        assert!(matches!(conflict_to_auth("vendors_email_key"), AuthError::EmailTaken));
        assert!(matches!(conflict_to_auth("vendors_name_key"), AuthError::NameTaken(_)));
    }
}
