//! Item repository: listings, images and joinery.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{
    CarveId, DecorationId, ItemId, ItemImageId, LazyField, MaterialId, PaintId, Price, SandId,
    SecondCategoryId, SecondSceneId, StoveId, StyleId, TenonId, VendorId,
};

use super::{Page, PageRequest, RepositoryError, parse_price};
use crate::models::{Item, ItemImage};

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i32,
    vendor_id: i32,
    item: String,
    price: i32,
    material_id: i32,
    second_category_id: i32,
    second_scene_id: i32,
    style_id: i32,
    length: i32,
    width: i32,
    height: i32,
    stove_id: i32,
    carve_id: i32,
    sand_id: i32,
    paint_id: i32,
    decoration_id: i32,
    story: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ItemId::new(row.id),
            vendor_id: VendorId::new(row.vendor_id),
            item: row.item,
            price: parse_price(row.price)?,
            material_id: MaterialId::new(row.material_id),
            second_category_id: SecondCategoryId::new(row.second_category_id),
            second_scene_id: SecondSceneId::new(row.second_scene_id),
            style_id: StyleId::new(row.style_id),
            length: row.length,
            width: row.width,
            height: row.height,
            stove_id: StoveId::new(row.stove_id),
            carve_id: CarveId::new(row.carve_id),
            sand_id: SandId::new(row.sand_id),
            paint_id: PaintId::new(row.paint_id),
            decoration_id: DecorationId::new(row.decoration_id),
            story: row.story,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            vendor: LazyField::new(),
            second_category: LazyField::new(),
            images: LazyField::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemImageRow {
    id: i32,
    item_id: i32,
    path: String,
    hash: String,
    sort: i32,
    filename: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl From<ItemImageRow> for ItemImage {
    fn from(row: ItemImageRow) -> Self {
        Self {
            id: ItemImageId::new(row.id),
            item_id: ItemId::new(row.item_id),
            path: row.path,
            hash: row.hash,
            sort: row.sort,
            filename: row.filename,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            item: LazyField::new(),
            url: LazyField::new(),
        }
    }
}

/// Fields of the item form.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub vendor_id: VendorId,
    pub item: String,
    pub price: Price,
    pub material_id: MaterialId,
    pub second_category_id: SecondCategoryId,
    pub second_scene_id: SecondSceneId,
    pub style_id: StyleId,
    pub length: i32,
    pub width: i32,
    pub height: i32,
    pub stove_id: StoveId,
    pub carve_id: CarveId,
    pub sand_id: SandId,
    pub paint_id: PaintId,
    pub decoration_id: DecorationId,
    pub story: String,
    pub tenon_ids: Vec<TenonId>,
}

/// Repository for item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an item by ID, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        sqlx::query_as::<_, ItemRow>("SELECT * FROM marketplace.items WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Item::try_from)
            .transpose()
    }

    /// A vendor's live items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_vendor(
        &self,
        vendor_id: VendorId,
        request: PageRequest,
    ) -> Result<Page<Item>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM marketplace.items WHERE vendor_id = $1 AND NOT is_deleted",
        )
        .bind(vendor_id)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT * FROM marketplace.items
            WHERE vendor_id = $1 AND NOT is_deleted
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(vendor_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, request, total))
    }

    /// Live items from confirmed vendors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Item>, RepositoryError> {
        sqlx::query_as::<_, ItemRow>(
            r"
            SELECT i.* FROM marketplace.items i
            JOIN marketplace.vendors v ON v.id = i.vendor_id
            WHERE NOT i.is_deleted AND v.confirmed
            ORDER BY i.created_at DESC, i.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect()
    }

    /// Create an item with its joinery techniques.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// unknown reference IDs).
    pub async fn create(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO marketplace.items
                (vendor_id, item, price, material_id, second_category_id, second_scene_id,
                 style_id, length, width, height, stove_id, carve_id, sand_id, paint_id,
                 decoration_id, story)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            ",
        )
        .bind(item.vendor_id)
        .bind(&item.item)
        .bind(item.price.yuan())
        .bind(item.material_id)
        .bind(item.second_category_id)
        .bind(item.second_scene_id)
        .bind(item.style_id)
        .bind(item.length)
        .bind(item.width)
        .bind(item.height)
        .bind(item.stove_id)
        .bind(item.carve_id)
        .bind(item.sand_id)
        .bind(item.paint_id)
        .bind(item.decoration_id)
        .bind(&item.story)
        .fetch_one(&mut *tx)
        .await?;

        for tenon_id in &item.tenon_ids {
            sqlx::query(
                r"
                INSERT INTO marketplace.item_tenons (item_id, tenon_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(row.id)
            .bind(tenon_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Item::try_from(row)
    }

    /// Soft-delete one of a vendor's items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor has no live item with
    /// this ID.
    pub async fn soft_delete(&self, vendor_id: VendorId, id: ItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE marketplace.items SET is_deleted = TRUE
            WHERE id = $1 AND vendor_id = $2 AND NOT is_deleted
            ",
        )
        .bind(id)
        .bind(vendor_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Live images of an item, by `sort` then upload time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, item_id: ItemId) -> Result<Vec<ItemImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemImageRow>(
            r"
            SELECT id, item_id, path, hash, sort, filename, is_deleted, created_at
            FROM marketplace.item_images
            WHERE item_id = $1 AND NOT is_deleted
            ORDER BY sort, created_at, id
            ",
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(ItemImage::from).collect())
    }

    /// Joinery techniques of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tenon_ids(&self, item_id: ItemId) -> Result<Vec<TenonId>, RepositoryError> {
        let ids: Vec<TenonId> = sqlx::query_scalar(
            "SELECT tenon_id FROM marketplace.item_tenons WHERE item_id = $1 ORDER BY tenon_id",
        )
        .bind(item_id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }
}
