//! Catalogue reference tables and their seed data.

use sqlx::{PgPool, Postgres, Transaction};

use rosewood_core::{FirstCategoryId, SecondCategoryId};

use super::RepositoryError;
use crate::models::{Choice, ItemFormOptions, SecondCategory};

/// First categories with their second categories.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("椅凳类", &["交椅", "圈椅", "太师椅", "官帽椅", "长凳", "鼓凳", "杌凳", "宝座"]),
    ("桌案类", &["书桌", "画案", "条形桌案", "方桌", "八仙桌", "炕桌", "炕几"]),
    ("床榻类", &["拔步床", "架子床", "罗汉床", "榻"]),
    ("柜架类", &["书柜", "顶箱柜", "方角柜", "圆角柜", "酒柜", "书架", "衣架", "博古架"]),
    ("其他类", &["箱", "屏风", "挂件", "手串", "雕刻工艺品"]),
];

/// First scenes with their second scenes.
pub const SCENES: &[(&str, &[&str])] = &[
    ("家庭", &["书房", "客厅", "卧室", "厨卫", "餐厅", "儿童房"]),
    ("办公", &["酒店", "工作室"]),
    ("工艺品", &["工艺品"]),
    ("其他", &["其他"]),
];

pub const STYLES: &[&str] = &["明式", "清式", "新中式", "仿古"];

pub const MATERIALS: &[&str] = &[
    "紫檀木", "花梨木", "香枝木", "黑酸枝木", "红酸枝木", "鸡翅木", "乌木", "条纹乌木",
];

pub const STOVES: &[&str] = &["水煮", "蒸汽", "煮蜡"];

pub const CARVES: &[&str] = &[
    "透雕", "浮雕", "浅浮雕", "镂空雕", "圆雕(立体雕)", "微雕", "阴阳额雕", "阴雕", "通雕",
];

/// Sandpaper grits.
pub const SANDS: &[i32] = &[
    180, 280, 320, 400, 600, 800, 1000, 1200, 1500, 2000, 2500, 3000, 4000, 5000,
];

pub const PAINTS: &[&str] = &["生漆", "烫蜡"];

pub const DECORATIONS: &[&str] = &["白铜镶嵌", "黄铜镶嵌", "石料镶嵌"];

pub const TENONS: &[&str] = &[
    "燕尾榫", "明榫", "暗榫", "楔钉榫", "套榫", "抱肩榫", "勾挂榫", "夹头榫", "插肩榫", "走马销",
    "平榫",
];

/// Flat tables: `(table, column, values)`.
const NAME_TABLES: &[(&str, &str, &[&str])] = &[
    ("styles", "style", STYLES),
    ("materials", "material", MATERIALS),
    ("stoves", "stove", STOVES),
    ("carves", "carve", CARVES),
    ("paints", "paint", PAINTS),
    ("decorations", "decoration", DECORATIONS),
    ("tenons", "tenon", TENONS),
];

/// Two-level tables: `(first table, first column, second table, second
/// column, parent column, values)`.
const TREE_TABLES: &[(&str, &str, &str, &str, &str, &[(&str, &[&str])])] = &[
    (
        "first_categories",
        "first_category",
        "second_categories",
        "second_category",
        "first_category_id",
        CATEGORIES,
    ),
    (
        "first_scenes",
        "first_scene",
        "second_scenes",
        "second_scene",
        "first_scene_id",
        SCENES,
    ),
];

#[derive(sqlx::FromRow)]
struct ChoiceRow {
    id: i32,
    name: String,
}

impl From<ChoiceRow> for Choice {
    fn from(row: ChoiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SecondCategoryRow {
    id: i32,
    second_category: String,
    first_category_id: i32,
}

/// Tables written by a seed run, with the number of rows inserted.
pub type SeedReport = Vec<(&'static str, usize)>;

/// Repository for reference table lookups and seeding.
pub struct ReferenceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReferenceRepository<'a> {
    /// Create a new reference repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a second category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn second_category_by_id(
        &self,
        id: SecondCategoryId,
    ) -> Result<Option<SecondCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SecondCategoryRow>(
            r"
            SELECT id, second_category, first_category_id
            FROM marketplace.second_categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| SecondCategory {
            id: SecondCategoryId::new(r.id),
            name: r.second_category,
            first_category_id: FirstCategoryId::new(r.first_category_id),
        }))
    }

    async fn choices(&self, table: &str, column: &str) -> Result<Vec<Choice>, RepositoryError> {
        // Table and column names only ever come from the constants above.
        let sql = format!("SELECT id, {column}::TEXT AS name FROM marketplace.{table} ORDER BY id");
        let rows = sqlx::query_as::<_, ChoiceRow>(&sql).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Choice::from).collect())
    }

    /// Every select of the item form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn item_form_options(&self) -> Result<ItemFormOptions, RepositoryError> {
        Ok(ItemFormOptions {
            materials: self.choices("materials", "material").await?,
            second_categories: self.choices("second_categories", "second_category").await?,
            second_scenes: self.choices("second_scenes", "second_scene").await?,
            styles: self.choices("styles", "style").await?,
            stoves: self.choices("stoves", "stove").await?,
            carves: self.choices("carves", "carve").await?,
            sands: self.choices("sands", "sand").await?,
            paints: self.choices("paints", "paint").await?,
            decorations: self.choices("decorations", "decoration").await?,
            tenons: self.choices("tenons", "tenon").await?,
        })
    }

    /// Fill every reference table that is still empty.
    ///
    /// Tables that already have rows are left alone, so running this twice is
    /// harmless.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails; nothing is
    /// written in that case.
    pub async fn seed(&self) -> Result<SeedReport, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut report = SeedReport::new();

        for &(first_table, first_column, second_table, second_column, parent_column, tree) in
            TREE_TABLES
        {
            if !is_empty(&mut tx, first_table).await? {
                continue;
            }
            let mut children = 0;
            for &(parent, names) in tree {
                let sql = format!(
                    "INSERT INTO marketplace.{first_table} ({first_column}) VALUES ($1) RETURNING id"
                );
                let parent_id: i32 = sqlx::query_scalar(&sql)
                    .bind(parent)
                    .fetch_one(&mut *tx)
                    .await?;
                let sql = format!(
                    "INSERT INTO marketplace.{second_table} ({second_column}, {parent_column}) VALUES ($1, $2)"
                );
                for name in names {
                    sqlx::query(&sql)
                        .bind(name)
                        .bind(parent_id)
                        .execute(&mut *tx)
                        .await?;
                    children += 1;
                }
            }
            report.push((first_table, tree.len()));
            report.push((second_table, children));
        }

        for &(table, column, names) in NAME_TABLES {
            if !is_empty(&mut tx, table).await? {
                continue;
            }
            let sql = format!("INSERT INTO marketplace.{table} ({column}) VALUES ($1)");
            for name in names {
                sqlx::query(&sql).bind(name).execute(&mut *tx).await?;
            }
            report.push((table, names.len()));
        }

        if is_empty(&mut tx, "sands").await? {
            for grit in SANDS {
                sqlx::query("INSERT INTO marketplace.sands (sand) VALUES ($1)")
                    .bind(grit)
                    .execute(&mut *tx)
                    .await?;
            }
            report.push(("sands", SANDS.len()));
        }

        tx.commit().await?;

        Ok(report)
    }
}

async fn is_empty(tx: &mut Transaction<'_, Postgres>, table: &str) -> Result<bool, RepositoryError> {
    let sql = format!("SELECT NOT EXISTS (SELECT 1 FROM marketplace.{table})");
    let empty: bool = sqlx::query_scalar(&sql).fetch_one(&mut **tx).await?;
    Ok(empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data_sizes() {
        assert_eq!(CATEGORIES.len(), 5);
        assert_eq!(CATEGORIES.iter().map(|(_, c)| c.len()).sum::<usize>(), 32);
        assert_eq!(SCENES.len(), 4);
        assert_eq!(SCENES.iter().map(|(_, s)| s.len()).sum::<usize>(), 10);
        assert_eq!(MATERIALS.len(), 8);
        assert_eq!(STOVES.len(), 3);
        assert_eq!(CARVES.len(), 9);
        assert_eq!(SANDS.len(), 14);
        assert_eq!(PAINTS.len(), 2);
        assert_eq!(DECORATIONS.len(), 3);
        assert_eq!(TENONS.len(), 11);
    }

    #[test]
    fn test_names_fit_columns() {
        let all = CATEGORIES
            .iter()
            .chain(SCENES)
            .flat_map(|(first, seconds)| std::iter::once(first).chain(seconds.iter()))
            .chain(NAME_TABLES.iter().flat_map(|(_, _, names)| names.iter()));
        for name in all {
            assert!(name.chars().count() <= 10, "{name} is too long");
        }
    }
}
