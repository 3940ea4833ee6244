//! Distributor repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::region::RegionCode;
use rosewood_core::{DistributorId, LazyField, VendorId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Distributor;

#[derive(sqlx::FromRow)]
struct DistributorRow {
    id: i32,
    username: String,
    vendor_id: i32,
    name: String,
    contact_telephone: String,
    contact_mobile: String,
    contact: String,
    email: String,
    email_confirmed: bool,
    is_revoked: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DistributorLoginRow {
    #[sqlx(flatten)]
    distributor: DistributorRow,
    password_hash: String,
}

impl From<DistributorRow> for Distributor {
    fn from(row: DistributorRow) -> Self {
        Self {
            id: DistributorId::new(row.id),
            username: row.username,
            vendor_id: VendorId::new(row.vendor_id),
            name: row.name,
            contact_telephone: row.contact_telephone,
            contact_mobile: row.contact_mobile,
            contact: row.contact,
            email: row.email,
            email_confirmed: row.email_confirmed,
            is_revoked: row.is_revoked,
            created_at: row.created_at,
            vendor: LazyField::new(),
            address: LazyField::new(),
            revocation: LazyField::new(),
        }
    }
}

/// Fields a vendor fills in when adding a distributor.
#[derive(Debug, Clone)]
pub struct NewDistributor {
    pub vendor_id: VendorId,
    /// Generated eight-digit login name.
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub contact: String,
    pub contact_telephone: String,
    pub contact_mobile: String,
    pub cn_id: RegionCode,
    pub address: String,
}

/// Repository for distributor database operations.
pub struct DistributorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DistributorRepository<'a> {
    /// Create a new distributor repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a distributor by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: DistributorId) -> Result<Option<Distributor>, RepositoryError> {
        let row = sqlx::query_as::<_, DistributorRow>(
            "SELECT * FROM marketplace.distributors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Distributor::from))
    }

    /// Find a distributor by username, with the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(
        &self,
        username: &str,
    ) -> Result<Option<(Distributor, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, DistributorLoginRow>(
            "SELECT * FROM marketplace.distributors WHERE username = $1",
        )
        .bind(username.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| (Distributor::from(r.distributor), r.password_hash)))
    }

    /// Whether a username is taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM marketplace.distributors WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a distributor together with its shop address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, distributor: &NewDistributor) -> Result<Distributor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DistributorRow>(
            r"
            INSERT INTO marketplace.distributors
                (password_hash, username, vendor_id, name, contact,
                 contact_telephone, contact_mobile)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(&distributor.password_hash)
        .bind(&distributor.username)
        .bind(distributor.vendor_id)
        .bind(&distributor.name)
        .bind(&distributor.contact)
        .bind(&distributor.contact_telephone)
        .bind(&distributor.contact_mobile)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "username"))?;

        sqlx::query(
            r"
            INSERT INTO marketplace.distributor_addresses (distributor_id, cn_id, address)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(row.id)
        .bind(distributor.cn_id.as_i32())
        .bind(&distributor.address)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Distributor::from(row))
    }

    /// A vendor's distributors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<Distributor>, RepositoryError> {
        let rows = sqlx::query_as::<_, DistributorRow>(
            r"
            SELECT * FROM marketplace.distributors
            WHERE vendor_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(vendor_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Distributor::from).collect())
    }

    /// Replace a distributor's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the distributor does not exist.
    pub async fn update_password(
        &self,
        id: DistributorId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE marketplace.distributors SET password_hash = $1 WHERE id = $2")
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
