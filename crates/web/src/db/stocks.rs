//! Per-distributor stock counts.

use sqlx::PgPool;

use rosewood_core::{DistributorId, ItemId, StockId};

use super::RepositoryError;
use crate::models::{Stock, StockLine, StockedDistributor};

#[derive(sqlx::FromRow)]
struct StockRow {
    id: i32,
    item_id: i32,
    distributor_id: i32,
    stock: i32,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Self {
            id: StockId::new(row.id),
            item_id: ItemId::new(row.item_id),
            distributor_id: DistributorId::new(row.distributor_id),
            stock: row.stock,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StockedDistributorRow {
    distributor_id: i32,
    name: String,
    stock: i32,
}

#[derive(sqlx::FromRow)]
struct StockLineRow {
    item_id: i32,
    item: String,
    stock: i32,
}

/// Repository for stock database operations.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    /// Create a new stock repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Set how many units a distributor holds of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        distributor_id: DistributorId,
        item_id: ItemId,
        stock: i32,
    ) -> Result<Stock, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(
            r"
            INSERT INTO marketplace.stocks (item_id, distributor_id, stock)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, distributor_id) DO UPDATE SET stock = EXCLUDED.stock
            RETURNING id, item_id, distributor_id, stock
            ",
        )
        .bind(item_id)
        .bind(distributor_id)
        .bind(stock)
        .fetch_one(self.pool)
        .await?;
        Ok(Stock::from(row))
    }

    /// Sum of the positive stock counts of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_for_item(&self, item_id: ItemId) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(stock), 0)::BIGINT
            FROM marketplace.stocks
            WHERE item_id = $1 AND stock > 0
            ",
        )
        .bind(item_id)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }

    /// Distributors holding the item that are not revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn in_stock_distributors(
        &self,
        item_id: ItemId,
    ) -> Result<Vec<StockedDistributor>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockedDistributorRow>(
            r"
            SELECT d.id AS distributor_id, d.name, s.stock
            FROM marketplace.stocks s
            JOIN marketplace.distributors d ON d.id = s.distributor_id
            WHERE s.item_id = $1 AND s.stock > 0 AND NOT d.is_revoked
            ORDER BY s.stock DESC, d.id
            ",
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StockedDistributor {
                distributor_id: DistributorId::new(r.distributor_id),
                name: r.name,
                stock: r.stock,
            })
            .collect())
    }

    /// A distributor's stock sheet over its vendor's live items.
    ///
    /// Items the distributor never stocked show up with zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sheet_for_distributor(
        &self,
        distributor_id: DistributorId,
    ) -> Result<Vec<StockLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockLineRow>(
            r"
            SELECT i.id AS item_id, i.item, COALESCE(s.stock, 0) AS stock
            FROM marketplace.distributors d
            JOIN marketplace.items i ON i.vendor_id = d.vendor_id AND NOT i.is_deleted
            LEFT JOIN marketplace.stocks s
                ON s.item_id = i.id AND s.distributor_id = d.id
            WHERE d.id = $1
            ORDER BY i.created_at DESC, i.id DESC
            ",
        )
        .bind(distributor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StockLine {
                item_id: ItemId::new(r.item_id),
                item: r.item,
                stock: r.stock,
            })
            .collect())
    }
}
