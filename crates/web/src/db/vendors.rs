//! Vendor repository: registration, verification and statistics.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::region::RegionCode;
use rosewood_core::{Email, LazyField, Mobile, VendorId};

use super::{RepositoryError, conflict_on_unique, parse_email, parse_mobile};
use crate::models::{Vendor, VendorStatistics};

#[derive(sqlx::FromRow)]
struct VendorRow {
    id: i32,
    mobile: String,
    email: String,
    email_confirmed: bool,
    created_at: DateTime<Utc>,
    logo: String,
    agent_name: String,
    agent_identity: String,
    agent_identity_front: String,
    agent_identity_back: String,
    name: String,
    license_limit: String,
    license_image: String,
    contact: String,
    telephone: String,
    introduction: String,
    confirmed: bool,
    confirmed_at: Option<DateTime<Utc>>,
    reject_message: String,
    rejected: bool,
    initialized: bool,
    item_permission: bool,
}

#[derive(sqlx::FromRow)]
struct VendorLoginRow {
    #[sqlx(flatten)]
    vendor: VendorRow,
    password_hash: String,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = RepositoryError;

    fn try_from(row: VendorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: VendorId::new(row.id),
            mobile: parse_mobile(&row.mobile)?,
            email: parse_email(&row.email)?,
            email_confirmed: row.email_confirmed,
            created_at: row.created_at,
            logo: row.logo,
            agent_name: row.agent_name,
            agent_identity: row.agent_identity,
            agent_identity_front: row.agent_identity_front,
            agent_identity_back: row.agent_identity_back,
            name: row.name,
            license_limit: row.license_limit,
            license_image: row.license_image,
            contact: row.contact,
            telephone: row.telephone,
            introduction: row.introduction,
            confirmed: row.confirmed,
            confirmed_at: row.confirmed_at,
            reject_message: row.reject_message,
            rejected: row.rejected,
            initialized: row.initialized,
            item_permission: row.item_permission,
            address: LazyField::new(),
            logo_url: LazyField::new(),
        })
    }
}

/// Fields collected by the vendor registration wizard.
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub password_hash: String,
    pub mobile: Mobile,
    pub email: Email,
    pub agent_name: String,
    pub agent_identity: String,
    pub name: String,
    pub license_limit: String,
    pub contact: String,
    pub telephone: String,
    pub introduction: String,
    /// Area of the registered address.
    pub cn_id: RegionCode,
    /// Street part of the registered address.
    pub address: String,
}

/// Agent data a rejected vendor resubmits.
#[derive(Debug, Clone)]
pub struct VendorReconfirmation {
    pub agent_name: String,
    pub agent_identity: String,
    pub agent_identity_front: String,
    pub agent_identity_back: String,
    pub license_limit: String,
    pub license_image: String,
}

/// Repository for vendor database operations.
pub struct VendorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VendorRepository<'a> {
    /// Create a new vendor repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a vendor by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_by_id(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError> {
        sqlx::query_as::<_, VendorRow>("SELECT * FROM marketplace.vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Vendor::try_from)
            .transpose()
    }

    /// Get a vendor by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Vendor>, RepositoryError> {
        sqlx::query_as::<_, VendorRow>("SELECT * FROM marketplace.vendors WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool)
            .await?
            .map(Vendor::try_from)
            .transpose()
    }

    /// Find a vendor by mobile or email, with the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(
        &self,
        login: &str,
    ) -> Result<Option<(Vendor, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, VendorLoginRow>(
            r"
            SELECT * FROM marketplace.vendors
            WHERE mobile = $1 OR email = lower($1)
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((Vendor::try_from(r.vendor)?, r.password_hash)))
            .transpose()
    }

    /// Whether any vendor exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn any(&self) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM marketplace.vendors)")
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Whether a mobile number is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mobile_exists(&self, mobile: &Mobile) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.vendors WHERE mobile = $1)",
        )
        .bind(mobile)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether an email address is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.vendors WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether a brand name is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_exists(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.vendors WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a vendor together with its registered address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the mobile, email or brand name
    /// is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, vendor: &NewVendor) -> Result<Vendor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, VendorRow>(
            r"
            INSERT INTO marketplace.vendors
                (password_hash, mobile, email, agent_name, agent_identity, name,
                 license_limit, contact, telephone, introduction)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(&vendor.password_hash)
        .bind(&vendor.mobile)
        .bind(&vendor.email)
        .bind(&vendor.agent_name)
        .bind(&vendor.agent_identity)
        .bind(&vendor.name)
        .bind(&vendor.license_limit)
        .bind(&vendor.contact)
        .bind(&vendor.telephone)
        .bind(&vendor.introduction)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "vendor"))?;

        sqlx::query(
            r"
            INSERT INTO marketplace.vendor_addresses (vendor_id, cn_id, address)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(row.id)
        .bind(vendor.cn_id.as_i32())
        .bind(&vendor.address)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Vendor::try_from(row)
    }

    /// Vendors waiting for review, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<Vendor>, RepositoryError> {
        sqlx::query_as::<_, VendorRow>(
            r"
            SELECT * FROM marketplace.vendors
            WHERE NOT confirmed AND NOT rejected
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Vendor::try_from)
        .collect()
    }

    /// Approve a vendor and let it list items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor does not exist.
    pub async fn confirm(&self, id: VendorId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE marketplace.vendors
            SET confirmed = TRUE, confirmed_at = now(), rejected = FALSE,
                reject_message = '', item_permission = TRUE
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Turn a vendor down with a message it will see.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor does not exist.
    pub async fn reject(&self, id: VendorId, message: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE marketplace.vendors
            SET rejected = TRUE, reject_message = $2, confirmed = FALSE,
                confirmed_at = NULL, item_permission = FALSE
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(message)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store resubmitted agent data and put the vendor back in the queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor does not exist.
    pub async fn reconfirm(
        &self,
        id: VendorId,
        data: &VendorReconfirmation,
    ) -> Result<Vendor, RepositoryError> {
        let row = sqlx::query_as::<_, VendorRow>(
            r"
            UPDATE marketplace.vendors
            SET agent_name = $2, agent_identity = $3, agent_identity_front = $4,
                agent_identity_back = $5, license_limit = $6, license_image = $7,
                rejected = FALSE, reject_message = ''
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&data.agent_name)
        .bind(&data.agent_identity)
        .bind(&data.agent_identity_front)
        .bind(&data.agent_identity_back)
        .bind(&data.license_limit)
        .bind(&data.license_image)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Vendor::try_from(row)
    }

    /// Count live items and distributors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn statistics(&self, id: VendorId) -> Result<VendorStatistics, RepositoryError> {
        let (items, distributors): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT count(*) FROM marketplace.items
                 WHERE vendor_id = $1 AND NOT is_deleted),
                (SELECT count(*) FROM marketplace.distributors
                 WHERE vendor_id = $1 AND NOT is_revoked)
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(VendorStatistics {
            items,
            distributors,
        })
    }

    /// Replace a vendor's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor does not exist.
    pub async fn update_password(&self, id: VendorId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE marketplace.vendors SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
