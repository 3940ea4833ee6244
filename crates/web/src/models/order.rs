//! Buyer orders.

use chrono::{DateTime, Utc};

use rosewood_core::{AddressId, DistributorId, ItemId, OrderId, Price, UserId};

/// An order a buyer placed for an item through one distributor.
///
/// Furniture is paid in two parts: a deposit when ordering and the balance
/// on delivery.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_address_id: AddressId,
    pub distributor_id: DistributorId,
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
    pub deposit: Price,
    pub deposit_paid: bool,
    pub price: Price,
    pub price_paid: bool,
}

impl Order {
    /// What is left to pay after the deposit.
    #[must_use]
    pub const fn balance(&self) -> Price {
        self.price.balance_after(self.deposit)
    }

    /// Whether both parts have been paid.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.deposit_paid && self.price_paid
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_and_settlement() {
        let mut order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            user_address_id: AddressId::new(1),
            distributor_id: DistributorId::new(1),
            item_id: ItemId::new(1),
            created_at: Utc::now(),
            deposit: Price::new(3_000).unwrap(),
            deposit_paid: true,
            price: Price::new(18_000).unwrap(),
            price_paid: false,
        };
        assert_eq!(order.balance().yuan(), 15_000);
        assert!(!order.is_settled());
        order.price_paid = true;
        assert!(order.is_settled());
    }
}
