//! Vendor (manufacturer) accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{AccountKind, Email, LazyField, Mobile, VendorId, VerificationStatus};

use super::{Account, Address};
use crate::db::{AddressRepository, RepositoryError, VendorRepository};
use crate::services::media;

/// A furniture manufacturer.
///
/// Vendors register with their agent's identity and business licence; an
/// administrator has to confirm them before they may list items.
#[derive(Debug, Clone)]
pub struct Vendor {
    pub id: VendorId,
    pub mobile: Mobile,
    pub email: Email,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
    /// Stored path of the brand logo.
    pub logo: String,
    pub agent_name: String,
    pub agent_identity: String,
    pub agent_identity_front: String,
    pub agent_identity_back: String,
    /// Brand name, unique across vendors.
    pub name: String,
    /// Business licence expiry, `YYYY/MM/DD`.
    pub license_limit: String,
    pub license_image: String,
    pub contact: String,
    pub telephone: String,
    pub introduction: String,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub reject_message: String,
    pub rejected: bool,
    pub initialized: bool,
    pub item_permission: bool,
    pub(crate) address: LazyField<Address>,
    pub(crate) logo_url: LazyField<String>,
}

/// Counts shown on the vendor dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VendorStatistics {
    /// Items not soft-deleted.
    pub items: i64,
    /// Distributors not revoked.
    pub distributors: i64,
}

impl Vendor {
    #[must_use]
    pub const fn verification_status(&self) -> VerificationStatus {
        VerificationStatus::from_flags(self.confirmed, self.rejected)
    }

    /// The vendor's registered address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn address(&mut self, pool: &PgPool) -> Result<Option<&mut Address>, RepositoryError> {
        let id = self.id;
        self.address
            .get_or_flush(|| async move { AddressRepository::new(pool).first_for_vendor(id).await })
            .await?;
        Ok(self.address.get_mut())
    }

    /// Public URL of the logo, if one was uploaded.
    pub fn logo_url(&mut self, media_base: &str) -> Option<&str> {
        let logo = &self.logo;
        self.logo_url
            .get_or_compute(|| media::media_url(media_base, logo))
            .map(String::as_str)
    }

    /// Item and distributor counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the queries fail.
    pub async fn statistics(&self, pool: &PgPool) -> Result<VendorStatistics, RepositoryError> {
        VendorRepository::new(pool).statistics(self.id).await
    }
}

impl Account for Vendor {
    const KIND: AccountKind = AccountKind::Vendor;

    fn raw_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
