//! Distributor (reseller) accounts and their revocations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{
    AccountKind, DistributorId, LazyField, RevocationId, RevocationState, VendorId,
};

use super::{Account, Address, Vendor};
use crate::db::{
    AddressRepository, DistributorRepository, RepositoryError, RevocationRepository,
    VendorRepository,
};

/// A reseller attached to one vendor.
///
/// Distributors are created by their vendor and log in with a generated
/// eight-digit username.
#[derive(Debug, Clone)]
pub struct Distributor {
    pub id: DistributorId,
    pub username: String,
    pub vendor_id: VendorId,
    /// Shop name.
    pub name: String,
    pub contact_telephone: String,
    pub contact_mobile: String,
    pub contact: String,
    pub email: String,
    pub email_confirmed: bool,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub(crate) vendor: LazyField<Box<Vendor>>,
    pub(crate) address: LazyField<Address>,
    pub(crate) revocation: LazyField<DistributorRevocation>,
}

impl Distributor {
    /// The vendor this distributor sells for.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn vendor(&mut self, pool: &PgPool) -> Result<Option<&Vendor>, RepositoryError> {
        let id = self.vendor_id;
        let vendor = self
            .vendor
            .get_or_flush(|| async move {
                Ok::<_, RepositoryError>(
                    VendorRepository::new(pool).get_by_id(id).await?.map(Box::new),
                )
            })
            .await?;
        Ok(vendor.map(AsRef::as_ref))
    }

    /// The shop address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn address(&mut self, pool: &PgPool) -> Result<Option<&mut Address>, RepositoryError> {
        let id = self.id;
        self.address
            .get_or_flush(|| async move {
                AddressRepository::new(pool).first_for_distributor(id).await
            })
            .await?;
        Ok(self.address.get_mut())
    }

    /// The most recent revocation filed for this distributor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn revocation(
        &mut self,
        pool: &PgPool,
    ) -> Result<Option<&DistributorRevocation>, RepositoryError> {
        let id = self.id;
        self.revocation
            .get_or_flush(|| async move {
                RevocationRepository::new(pool).latest_for_distributor(id).await
            })
            .await
    }

    /// Where the contract termination stands.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn revocation_state(&mut self, pool: &PgPool) -> Result<RevocationState, RepositoryError> {
        Ok(self
            .revocation(pool)
            .await?
            .map_or(RevocationState::None, DistributorRevocation::state))
    }
}

impl Account for Distributor {
    const KIND: AccountKind = AccountKind::Distributor;

    fn raw_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// A request to terminate a distributor's contract.
#[derive(Debug, Clone)]
pub struct DistributorRevocation {
    pub id: RevocationId,
    pub distributor_id: DistributorId,
    /// Stored path of the signed termination contract.
    pub contract: String,
    pub pending: bool,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub(crate) distributor: LazyField<Box<Distributor>>,
}

impl DistributorRevocation {
    #[must_use]
    pub const fn state(&self) -> RevocationState {
        RevocationState::from_row(Some((self.pending, self.is_revoked)))
    }

    /// The distributor the revocation was filed for.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn distributor(&mut self, pool: &PgPool) -> Result<Option<&Distributor>, RepositoryError> {
        let id = self.distributor_id;
        let distributor = self
            .distributor
            .get_or_flush(|| async move {
                Ok::<_, RepositoryError>(
                    DistributorRepository::new(pool).get_by_id(id).await?.map(Box::new),
                )
            })
            .await?;
        Ok(distributor.map(AsRef::as_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revocation(pending: bool, is_revoked: bool) -> DistributorRevocation {
        DistributorRevocation {
            id: RevocationId::new(1),
            distributor_id: DistributorId::new(2),
            contract: "contracts/2.jpg".to_owned(),
            pending,
            is_revoked,
            created_at: Utc::now(),
            distributor: LazyField::new(),
        }
    }

    #[test]
    fn test_revocation_state_from_flags() {
        assert_eq!(revocation(true, false).state(), RevocationState::Pending);
        assert_eq!(revocation(false, true).state(), RevocationState::Revoked);
        assert_eq!(revocation(false, false).state(), RevocationState::Rejected);
    }
}
