//! Catalogue items, their images and per-distributor stock.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rosewood_core::{
    CarveId, DecorationId, DistributorId, ItemId, ItemImageId, LazyField, MaterialId, PaintId,
    Price, SandId, SecondCategoryId, SecondSceneId, StockId, StoveId, StyleId, TenonId, VendorId,
};

use super::{SecondCategory, Vendor};
use crate::db::{
    ItemRepository, ReferenceRepository, RepositoryError, StockRepository, VendorRepository,
};
use crate::services::media;

/// A piece of furniture listed by a vendor.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub vendor_id: VendorId,
    /// Display name.
    pub item: String,
    /// Guide price.
    pub price: Price,
    pub material_id: MaterialId,
    pub second_category_id: SecondCategoryId,
    pub second_scene_id: SecondSceneId,
    pub style_id: StyleId,
    /// Dimensions in centimetres.
    pub length: i32,
    pub width: i32,
    pub height: i32,
    pub stove_id: StoveId,
    pub carve_id: CarveId,
    pub sand_id: SandId,
    pub paint_id: PaintId,
    pub decoration_id: DecorationId,
    pub story: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub(crate) vendor: LazyField<Box<Vendor>>,
    pub(crate) second_category: LazyField<SecondCategory>,
    pub(crate) images: LazyField<Vec<ItemImage>>,
}

impl Item {
    /// The vendor that listed the item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn vendor(&mut self, pool: &PgPool) -> Result<Option<&mut Vendor>, RepositoryError> {
        let id = self.vendor_id;
        self.vendor
            .get_or_flush(|| async move {
                Ok::<_, RepositoryError>(
                    VendorRepository::new(pool).get_by_id(id).await?.map(Box::new),
                )
            })
            .await?;
        Ok(self.vendor.get_mut().map(AsMut::as_mut))
    }

    /// The item's second-level category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn second_category(
        &mut self,
        pool: &PgPool,
    ) -> Result<Option<&SecondCategory>, RepositoryError> {
        let id = self.second_category_id;
        self.second_category
            .get_or_flush(|| async move {
                ReferenceRepository::new(pool).second_category_by_id(id).await
            })
            .await
    }

    /// Images that are not deleted, ordered by `sort` then upload time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn images(&mut self, pool: &PgPool) -> Result<&[ItemImage], RepositoryError> {
        let id = self.id;
        let images = self
            .images
            .get_or_flush(|| async move { ItemRepository::new(pool).images(id).await.map(Some) })
            .await?;
        Ok(images.map(Vec::as_slice).unwrap_or_default())
    }

    /// Joinery techniques used.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn tenon_ids(&self, pool: &PgPool) -> Result<Vec<TenonId>, RepositoryError> {
        ItemRepository::new(pool).tenon_ids(self.id).await
    }

    /// Total stock over all distributors, ignoring non-positive counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn stock_count(&self, pool: &PgPool) -> Result<i64, RepositoryError> {
        StockRepository::new(pool).total_for_item(self.id).await
    }

    /// Distributors that hold the item and are not revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn in_stock_distributors(
        &self,
        pool: &PgPool,
    ) -> Result<Vec<StockedDistributor>, RepositoryError> {
        StockRepository::new(pool).in_stock_distributors(self.id).await
    }
}

/// A photo of an item.
#[derive(Debug, Clone)]
pub struct ItemImage {
    pub id: ItemImageId,
    pub item_id: ItemId,
    /// Stored path, relative to the media root.
    pub path: String,
    /// MD5 of the file, used to skip duplicate uploads.
    pub hash: String,
    pub sort: i32,
    /// Original file name.
    pub filename: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub(crate) item: LazyField<Box<Item>>,
    pub(crate) url: LazyField<String>,
}

impl ItemImage {
    /// The item this image belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn item(&mut self, pool: &PgPool) -> Result<Option<&Item>, RepositoryError> {
        let id = self.item_id;
        let item = self
            .item
            .get_or_flush(|| async move {
                Ok::<_, RepositoryError>(
                    ItemRepository::new(pool).get_by_id(id).await?.map(Box::new),
                )
            })
            .await?;
        Ok(item.map(AsRef::as_ref))
    }

    /// Owner of the image, through its item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn vendor_id(&mut self, pool: &PgPool) -> Result<Option<VendorId>, RepositoryError> {
        Ok(self.item(pool).await?.map(|item| item.vendor_id))
    }

    /// Public URL of the image.
    pub fn url(&mut self, media_base: &str) -> Option<&str> {
        let path = &self.path;
        self.url
            .get_or_compute(|| media::media_url(media_base, path))
            .map(String::as_str)
    }
}

/// How many units of an item one distributor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    pub id: StockId,
    pub item_id: ItemId,
    pub distributor_id: DistributorId,
    pub stock: i32,
}

/// A distributor listed on an item page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockedDistributor {
    pub distributor_id: DistributorId,
    pub name: String,
    pub stock: i32,
}

/// One line of a distributor's stock sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub item_id: ItemId,
    pub item: String,
    pub stock: i32,
}
