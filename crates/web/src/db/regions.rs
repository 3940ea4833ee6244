//! Administrative division repository and loader.

use std::collections::HashMap;

use sqlx::PgPool;

use rosewood_core::region::{RegionCode, RegionLevel, RegionRecord};
use rosewood_core::{CityId, DistrictId, LazyField, ProvinceId};

use super::{RepositoryError, parse_region};
use crate::models::{Area, City, District, Province, RegionName};

#[derive(sqlx::FromRow)]
struct ProvinceRow {
    id: i32,
    cn_id: i32,
    province: String,
}

impl TryFrom<ProvinceRow> for Province {
    type Error = RepositoryError;

    fn try_from(row: ProvinceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProvinceId::new(row.id),
            cn_id: parse_region(row.cn_id)?,
            name: row.province,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: i32,
    cn_id: i32,
    city: String,
    province_id: i32,
}

impl TryFrom<CityRow> for City {
    type Error = RepositoryError;

    fn try_from(row: CityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CityId::new(row.id),
            cn_id: parse_region(row.cn_id)?,
            name: row.city,
            province_id: ProvinceId::new(row.province_id),
            province: LazyField::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct DistrictRow {
    id: i32,
    cn_id: i32,
    district: String,
    city_id: i32,
}

impl TryFrom<DistrictRow> for District {
    type Error = RepositoryError;

    fn try_from(row: DistrictRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DistrictId::new(row.id),
            cn_id: parse_region(row.cn_id)?,
            name: row.district,
            city_id: CityId::new(row.city_id),
            city: LazyField::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct RegionNameRow {
    cn_id: i32,
    name: String,
}

/// Row counts after a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSeedReport {
    pub provinces: usize,
    pub cities: usize,
    pub districts: usize,
}

/// Repository for province, city and district lookups.
pub struct RegionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegionRepository<'a> {
    /// Create a new region repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a province by row ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn province_by_id(&self, id: ProvinceId) -> Result<Option<Province>, RepositoryError> {
        sqlx::query_as::<_, ProvinceRow>(
            "SELECT id, cn_id, province FROM marketplace.provinces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Province::try_from)
        .transpose()
    }

    /// Get a city by row ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn city_by_id(&self, id: CityId) -> Result<Option<City>, RepositoryError> {
        sqlx::query_as::<_, CityRow>(
            "SELECT id, cn_id, city, province_id FROM marketplace.cities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(City::try_from)
        .transpose()
    }

    /// Resolve a code to a district, a city or a province, in that order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn area_for_code(&self, code: RegionCode) -> Result<Option<Area>, RepositoryError> {
        let district = sqlx::query_as::<_, DistrictRow>(
            "SELECT id, cn_id, district, city_id FROM marketplace.districts WHERE cn_id = $1",
        )
        .bind(code.as_i32())
        .fetch_optional(self.pool)
        .await?;
        if let Some(row) = district {
            return Ok(Some(Area::District(District::try_from(row)?)));
        }

        let city = sqlx::query_as::<_, CityRow>(
            "SELECT id, cn_id, city, province_id FROM marketplace.cities WHERE cn_id = $1",
        )
        .bind(code.as_i32())
        .fetch_optional(self.pool)
        .await?;
        if let Some(row) = city {
            return Ok(Some(Area::City(City::try_from(row)?)));
        }

        let province = sqlx::query_as::<_, ProvinceRow>(
            "SELECT id, cn_id, province FROM marketplace.provinces WHERE cn_id = $1",
        )
        .bind(code.as_i32())
        .fetch_optional(self.pool)
        .await?;
        province
            .map(|row| Province::try_from(row).map(Area::Province))
            .transpose()
    }

    /// The divisions directly below `parent`, or all provinces when `parent`
    /// is `None`. Used by the cascading address selects.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn children(&self, parent: Option<RegionCode>) -> Result<Vec<RegionName>, RepositoryError> {
        let rows = match parent.map(RegionCode::level) {
            None => {
                sqlx::query_as::<_, RegionNameRow>(
                    "SELECT cn_id, province AS name FROM marketplace.provinces ORDER BY cn_id",
                )
                .fetch_all(self.pool)
                .await?
            }
            Some(RegionLevel::Province) => {
                sqlx::query_as::<_, RegionNameRow>(
                    r"
                    SELECT c.cn_id, c.city AS name
                    FROM marketplace.cities c
                    JOIN marketplace.provinces p ON p.id = c.province_id
                    WHERE p.cn_id = $1
                    ORDER BY c.cn_id
                    ",
                )
                .bind(parent.map(RegionCode::as_i32))
                .fetch_all(self.pool)
                .await?
            }
            Some(RegionLevel::City) => {
                sqlx::query_as::<_, RegionNameRow>(
                    r"
                    SELECT d.cn_id, d.district AS name
                    FROM marketplace.districts d
                    JOIN marketplace.cities c ON c.id = d.city_id
                    WHERE c.cn_id = $1
                    ORDER BY d.cn_id
                    ",
                )
                .bind(parent.map(RegionCode::as_i32))
                .fetch_all(self.pool)
                .await?
            }
            Some(RegionLevel::District) => Vec::new(),
        };

        rows.into_iter()
            .map(|r| {
                Ok(RegionName {
                    cn_id: parse_region(r.cn_id)?,
                    name: r.name,
                })
            })
            .collect()
    }

    /// Code of a random district, for demo data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no districts are loaded.
    pub async fn random_district_code(&self) -> Result<RegionCode, RepositoryError> {
        let code: Option<i32> = sqlx::query_scalar(
            "SELECT cn_id FROM marketplace.districts ORDER BY random() LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;
        parse_region(code.ok_or(RepositoryError::NotFound)?)
    }

    /// Whether any province has been loaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_seeded(&self) -> Result<bool, RepositoryError> {
        let seeded: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM marketplace.provinces)")
                .fetch_one(self.pool)
                .await?;
        Ok(seeded)
    }

    /// Insert planned records in one transaction.
    ///
    /// Records must list parents before children, as
    /// [`rosewood_core::region::plan`] guarantees.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a record names a parent
    /// that was not inserted before it, or `RepositoryError::Conflict` if a
    /// code is already present.
    pub async fn seed(&self, records: &[RegionRecord]) -> Result<RegionSeedReport, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut ids: HashMap<RegionCode, i32> = HashMap::with_capacity(records.len());
        let mut report = RegionSeedReport::default();

        for record in records {
            let parent_id = match record.parent {
                Some(code) => Some(*ids.get(&code).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "region {} listed before its parent {code}",
                        record.code
                    ))
                })?),
                None => None,
            };

            let id: i32 = match (record.level, parent_id) {
                (RegionLevel::Province, _) => {
                    report.provinces += 1;
                    sqlx::query_scalar::<_, i32>(
                        "INSERT INTO marketplace.provinces (cn_id, province) VALUES ($1, $2) RETURNING id",
                    )
                    .bind(record.code.as_i32())
                    .bind(&record.name)
                    .fetch_one(&mut *tx)
                    .await
                }
                (RegionLevel::City, Some(province_id)) => {
                    report.cities += 1;
                    sqlx::query_scalar::<_, i32>(
                        "INSERT INTO marketplace.cities (cn_id, city, province_id) VALUES ($1, $2, $3) RETURNING id",
                    )
                    .bind(record.code.as_i32())
                    .bind(&record.name)
                    .bind(province_id)
                    .fetch_one(&mut *tx)
                    .await
                }
                (RegionLevel::District, Some(city_id)) => {
                    report.districts += 1;
                    sqlx::query_scalar::<_, i32>(
                        "INSERT INTO marketplace.districts (cn_id, district, city_id) VALUES ($1, $2, $3) RETURNING id",
                    )
                    .bind(record.code.as_i32())
                    .bind(&record.name)
                    .bind(city_id)
                    .fetch_one(&mut *tx)
                    .await
                }
                (_, None) => {
                    return Err(RepositoryError::DataCorruption(format!(
                        "region {} has no parent",
                        record.code
                    )));
                }
            }
            .map_err(|e| super::conflict_on_unique(e, "region"))?;

            ids.insert(record.code, id);
        }

        tx.commit().await?;

        Ok(report)
    }
}
