//! Buyer wishlists.

use chrono::{DateTime, Utc};

use rosewood_core::{CollectionId, ItemId, Price, UserId};

/// An item a buyer saved for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub id: CollectionId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
}

/// A wishlist row joined with the item it points at, for the list page.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub item_id: ItemId,
    pub item: String,
    pub price: Price,
    /// The item was soft-deleted after it was saved.
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}
