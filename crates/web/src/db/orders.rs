//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{AddressId, DistributorId, ItemId, OrderId, Price, UserId};

use super::{RepositoryError, parse_price};
use crate::models::Order;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    user_address_id: i32,
    distributor_id: i32,
    item_id: i32,
    created_at: DateTime<Utc>,
    deposit: i32,
    deposit_paid: bool,
    price: i32,
    price_paid: bool,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            user_address_id: AddressId::new(row.user_address_id),
            distributor_id: DistributorId::new(row.distributor_id),
            item_id: ItemId::new(row.item_id),
            created_at: row.created_at,
            deposit: parse_price(row.deposit)?,
            deposit_paid: row.deposit_paid,
            price: parse_price(row.price)?,
            price_paid: row.price_paid,
        })
    }
}

/// An order as placed from the item page.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_address_id: AddressId,
    pub distributor_id: DistributorId,
    pub item_id: ItemId,
    pub deposit: Price,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order at the item's current guide price.
    ///
    /// The address must belong to the buyer, the item must be live and the
    /// distributor must hold it and not be revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any of those checks fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO marketplace.orders
                (user_id, user_address_id, distributor_id, item_id, deposit, price)
            SELECT $1, a.id, d.id, i.id, LEAST($5, i.price), i.price
            FROM marketplace.user_addresses a,
                 marketplace.items i,
                 marketplace.distributors d
            JOIN marketplace.stocks s ON s.distributor_id = d.id
            WHERE a.id = $2 AND a.user_id = $1
              AND i.id = $4 AND NOT i.is_deleted
              AND d.id = $3 AND NOT d.is_revoked
              AND s.item_id = i.id AND s.stock > 0
            RETURNING id, user_id, user_address_id, distributor_id, item_id, created_at,
                      deposit, deposit_paid, price, price_paid
            ",
        )
        .bind(order.user_id)
        .bind(order.user_address_id)
        .bind(order.distributor_id)
        .bind(order.item_id)
        .bind(order.deposit.yuan())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Order::try_from(row)
    }

    /// A buyer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, user_address_id, distributor_id, item_id, created_at,
                   deposit, deposit_paid, price, price_paid
            FROM marketplace.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect()
    }
}
