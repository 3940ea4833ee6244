//! Buyer wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{CollectionId, ItemId, UserId};

use super::{Page, PageRequest, RepositoryError, parse_price};
use crate::models::{Collection, CollectionEntry};

#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: i32,
    user_id: i32,
    item_id: i32,
    created_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: CollectionId::new(row.id),
            user_id: UserId::new(row.user_id),
            item_id: ItemId::new(row.item_id),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CollectionEntryRow {
    item_id: i32,
    item: String,
    price: i32,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

/// Repository for wishlist database operations.
pub struct CollectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of a buyer's wishlist, most recently saved first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        request: PageRequest,
    ) -> Result<Page<CollectionEntry>, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT count(*) FROM marketplace.collections WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        let rows = sqlx::query_as::<_, CollectionEntryRow>(
            r"
            SELECT c.item_id, i.item, i.price, i.is_deleted, c.created_at
            FROM marketplace.collections c
            JOIN marketplace.items i ON i.id = c.item_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|r| {
                Ok(CollectionEntry {
                    item_id: ItemId::new(r.item_id),
                    item: r.item,
                    price: parse_price(r.price)?,
                    is_deleted: r.is_deleted,
                    created_at: r.created_at,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Page::new(entries, request, total))
    }

    /// The wishlist row for an item, if saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, user_id: UserId, item_id: ItemId) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            SELECT id, user_id, item_id, created_at
            FROM marketplace.collections
            WHERE user_id = $1 AND item_id = $2
            ",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Collection::from))
    }

    /// Save an item. Returns `false` if it was already saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including an
    /// unknown item).
    pub async fn add(&self, user_id: UserId, item_id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO marketplace.collections (user_id, item_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, item_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unsave an item. Returns `false` if it was not saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, item_id: ItemId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM marketplace.collections WHERE user_id = $1 AND item_id = $2")
                .bind(user_id)
                .bind(item_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
