//! Account address repository.
//!
//! Each account kind has its own address table with the same shape; buyer
//! addresses additionally carry a delivery phone.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::region::RegionCode;
use rosewood_core::{AddressId, DistributorId, LazyField, Mobile, UserId, VendorId};

use super::{RepositoryError, parse_mobile, parse_region};
use crate::models::{Address, AddressOwner};

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    owner_id: i32,
    cn_id: i32,
    address: String,
    mobile: Option<String>,
    created_at: DateTime<Utc>,
}

impl AddressRow {
    fn into_address(
        self,
        owner: impl FnOnce(i32) -> AddressOwner,
    ) -> Result<Address, RepositoryError> {
        Ok(Address {
            id: AddressId::new(self.id),
            owner: owner(self.owner_id),
            cn_id: parse_region(self.cn_id)?,
            address: self.address,
            mobile: self.mobile.as_deref().map(parse_mobile).transpose()?,
            created_at: self.created_at,
            area: LazyField::new(),
        })
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A vendor's registered address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_for_vendor(&self, vendor_id: VendorId) -> Result<Option<Address>, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, vendor_id AS owner_id, cn_id, address, NULL::TEXT AS mobile, created_at
            FROM marketplace.vendor_addresses
            WHERE vendor_id = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(vendor_id)
        .fetch_optional(self.pool)
        .await?
        .map(|row| row.into_address(|id| AddressOwner::Vendor(VendorId::new(id))))
        .transpose()
    }

    /// A distributor's shop address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_for_distributor(
        &self,
        distributor_id: DistributorId,
    ) -> Result<Option<Address>, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, distributor_id AS owner_id, cn_id, address, NULL::TEXT AS mobile,
                   created_at
            FROM marketplace.distributor_addresses
            WHERE distributor_id = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(distributor_id)
        .fetch_optional(self.pool)
        .await?
        .map(|row| row.into_address(|id| AddressOwner::Distributor(DistributorId::new(id))))
        .transpose()
    }

    /// A buyer's delivery addresses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id AS owner_id, cn_id, address, mobile::TEXT AS mobile, created_at
            FROM marketplace.user_addresses
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| row.into_address(|id| AddressOwner::User(UserId::new(id))))
        .collect()
    }

    /// Add a delivery address for a buyer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_for_user(
        &self,
        user_id: UserId,
        cn_id: RegionCode,
        address: &str,
        mobile: &Mobile,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO marketplace.user_addresses (user_id, cn_id, address, mobile)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id AS owner_id, cn_id, address, mobile::TEXT AS mobile,
                      created_at
            ",
        )
        .bind(user_id)
        .bind(cn_id.as_i32())
        .bind(address)
        .bind(mobile)
        .fetch_one(self.pool)
        .await?
        .into_address(|id| AddressOwner::User(UserId::new(id)))
    }
}
