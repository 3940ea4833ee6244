//! Database operations for the marketplace `PostgreSQL`.
//!
//! # Schema: `marketplace`
//!
//! ## Tables
//!
//! - `users`, `vendors`, `distributors`, `privileges` - the four account kinds
//! - `distributor_revocations` - contract terminations awaiting review
//! - `items`, `item_images`, `item_tenons`, `stocks` - the catalogue
//! - `collections`, `orders` - buyer activity
//! - `provinces`, `cities`, `districts` - administrative divisions
//! - `user_addresses`, `vendor_addresses`, `distributor_addresses`
//! - reference tables (`first_categories`, `materials`, `tenons`, ...)
//!
//! Queries are checked at runtime (`query_as` into `FromRow` row types)
//! and converted into the validated types in [`crate::models`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p rosewood-cli -- migrate
//! ```

pub mod addresses;
pub mod collections;
pub mod distributors;
pub mod items;
pub mod orders;
pub mod privileges;
pub mod references;
pub mod regions;
pub mod revocations;
pub mod stocks;
pub mod users;
pub mod vendors;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use rosewood_core::region::RegionCode;
use rosewood_core::{Email, Mobile, Price};

pub use addresses::AddressRepository;
pub use collections::CollectionRepository;
pub use distributors::{DistributorRepository, NewDistributor};
pub use items::{ItemRepository, NewItem};
pub use orders::{NewOrder, OrderRepository};
pub use privileges::PrivilegeRepository;
pub use references::ReferenceRepository;
pub use regions::RegionRepository;
pub use revocations::RevocationRepository;
pub use stocks::StockRepository;
pub use users::{NewUser, UserRepository};
pub use vendors::{NewVendor, VendorReconfirmation, VendorRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or("unique");
        return RepositoryError::Conflict(format!("{what} already exists ({constraint})"));
    }
    RepositoryError::Database(e)
}

pub(crate) fn parse_email(s: &str) -> Result<Email, RepositoryError> {
    Email::parse(s)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

pub(crate) fn parse_mobile(s: &str) -> Result<Mobile, RepositoryError> {
    Mobile::parse(s)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid mobile in database: {e}")))
}

pub(crate) fn parse_region(code: i32) -> Result<RegionCode, RepositoryError> {
    RegionCode::from_i32(code)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid cn_id in database: {code}")))
}

pub(crate) fn parse_price(yuan: i32) -> Result<Price, RepositoryError> {
    Price::new(yuan)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("negative price in database: {yuan}")))
}

/// Which page of a listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Page `page` (clamped to at least 1) of `per_page` rows.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
        }
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// One page of a listing with the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// Number of pages, at least 1.
    #[must_use]
    pub fn pages(&self) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (self.total.max(0) + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let request = PageRequest::new(Some(0), 50);
        assert_eq!(request.page, 1);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(Some(3), 100);
        assert_eq!(request.limit(), 100);
        assert_eq!(request.offset(), 200);

        assert_eq!(PageRequest::new(None, 50).page, 1);
    }

    #[test]
    fn test_page_counts() {
        let request = PageRequest::new(Some(2), 50);
        let page = Page::new(vec![0u8; 50], request, 101);
        assert_eq!(page.pages(), 3);
        assert!(page.has_prev());
        assert!(page.has_next());

        let empty: Page<u8> = Page::new(Vec::new(), PageRequest::new(None, 50), 0);
        assert_eq!(empty.pages(), 1);
        assert!(!empty.has_prev());
        assert!(!empty.has_next());
    }

    #[test]
    fn test_corrupt_values_are_reported() {
        assert!(matches!(parse_region(12), Err(RepositoryError::DataCorruption(_))));
        assert!(matches!(parse_price(-5), Err(RepositoryError::DataCorruption(_))));
        assert!(parse_mobile("13812345678").is_ok());
    }
}
