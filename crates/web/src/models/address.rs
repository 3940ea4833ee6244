//! Street addresses attached to accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::region::RegionCode;
use rosewood_core::{AddressId, DistributorId, LazyField, Mobile, UserId, VendorId};

use super::Area;
use crate::db::{RegionRepository, RepositoryError};

/// Which account an address belongs to, and therefore which table it is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOwner {
    User(UserId),
    Vendor(VendorId),
    Distributor(DistributorId),
}

/// A street address inside an administrative area.
#[derive(Debug, Clone)]
pub struct Address {
    pub id: AddressId,
    pub owner: AddressOwner,
    /// Code of the district (or city, or province) the address is in.
    pub cn_id: RegionCode,
    /// Street part, e.g. `中山路8号`.
    pub address: String,
    /// Delivery phone; only buyer addresses carry one.
    pub mobile: Option<Mobile>,
    pub created_at: DateTime<Utc>,
    pub(crate) area: LazyField<Area>,
}

impl Address {
    /// The area `cn_id` points at, trying districts, then cities, then
    /// provinces.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn area(&mut self, pool: &PgPool) -> Result<Option<&mut Area>, RepositoryError> {
        let code = self.cn_id;
        self.area
            .get_or_flush(|| async move { RegionRepository::new(pool).area_for_code(code).await })
            .await?;
        Ok(self.area.get_mut())
    }

    /// Area without the street, or empty if the code matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn vague_address(&mut self, pool: &PgPool) -> Result<String, RepositoryError> {
        match self.area(pool).await? {
            Some(area) => area.area_address(pool).await,
            None => Ok(String::new()),
        }
    }

    /// Area followed by the street.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn precise_address(&mut self, pool: &PgPool) -> Result<String, RepositoryError> {
        let vague = self.vague_address(pool).await?;
        Ok(format!("{vague}{}", self.address))
    }
}
