//! Provinces, cities and districts.
//!
//! Cities and districts know their parent only by id; the parent row is
//! loaded into a [`LazyField`] the first time an area address is built.

use serde::Serialize;
use sqlx::PgPool;

use rosewood_core::region::{self, RegionCode};
use rosewood_core::{CityId, DistrictId, LazyField, ProvinceId};

use crate::db::{RegionRepository, RepositoryError};

/// One step of an area's breadcrumb, from province down. Also the JSON
/// shape of the region picker's options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionName {
    pub cn_id: RegionCode,
    pub name: String,
}

/// A province (or municipality).
#[derive(Debug, Clone)]
pub struct Province {
    pub id: ProvinceId,
    pub cn_id: RegionCode,
    pub name: String,
}

impl Province {
    #[must_use]
    pub fn area_address(&self) -> String {
        self.name.clone()
    }

    #[must_use]
    pub fn grade(&self) -> Vec<RegionName> {
        vec![RegionName {
            cn_id: self.cn_id,
            name: self.name.clone(),
        }]
    }
}

/// A prefecture-level city.
#[derive(Debug, Clone)]
pub struct City {
    pub id: CityId,
    pub cn_id: RegionCode,
    pub name: String,
    pub province_id: ProvinceId,
    pub(crate) province: LazyField<Province>,
}

impl City {
    /// The enclosing province.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn province(&mut self, pool: &PgPool) -> Result<Option<&Province>, RepositoryError> {
        let id = self.province_id;
        self.province
            .get_or_flush(|| async move { RegionRepository::new(pool).province_by_id(id).await })
            .await
    }

    /// `江苏省南京市`, or just `北京市` for a municipality.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the province lookup fails.
    pub async fn area_address(&mut self, pool: &PgPool) -> Result<String, RepositoryError> {
        let city = self.name.clone();
        Ok(match self.province(pool).await? {
            Some(province) => region::city_area_address(&province.name, &city),
            None => city,
        })
    }

    /// Province, then city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the province lookup fails.
    pub async fn grade(&mut self, pool: &PgPool) -> Result<Vec<RegionName>, RepositoryError> {
        let own = RegionName {
            cn_id: self.cn_id,
            name: self.name.clone(),
        };
        let mut grade = self.province(pool).await?.map(Province::grade).unwrap_or_default();
        grade.push(own);
        Ok(grade)
    }
}

/// A district or county.
#[derive(Debug, Clone)]
pub struct District {
    pub id: DistrictId,
    pub cn_id: RegionCode,
    pub name: String,
    pub city_id: CityId,
    pub(crate) city: LazyField<City>,
}

impl District {
    /// The enclosing city.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn city(&mut self, pool: &PgPool) -> Result<Option<&mut City>, RepositoryError> {
        let id = self.city_id;
        self.city
            .get_or_flush(|| async move { RegionRepository::new(pool).city_by_id(id).await })
            .await?;
        Ok(self.city.get_mut())
    }

    /// The city's area address followed by the district name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a parent lookup fails.
    pub async fn area_address(&mut self, pool: &PgPool) -> Result<String, RepositoryError> {
        let district = self.name.clone();
        Ok(match self.city(pool).await? {
            Some(city) => format!("{}{district}", city.area_address(pool).await?),
            None => district,
        })
    }

    /// Province, city, then district.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a parent lookup fails.
    pub async fn grade(&mut self, pool: &PgPool) -> Result<Vec<RegionName>, RepositoryError> {
        let own = RegionName {
            cn_id: self.cn_id,
            name: self.name.clone(),
        };
        let mut grade = match self.city(pool).await? {
            Some(city) => city.grade(pool).await?,
            None => Vec::new(),
        };
        grade.push(own);
        Ok(grade)
    }
}

/// Whatever level a `cn_id` resolved to.
#[derive(Debug, Clone)]
pub enum Area {
    Province(Province),
    City(City),
    District(District),
}

impl Area {
    #[must_use]
    pub const fn cn_id(&self) -> RegionCode {
        match self {
            Self::Province(p) => p.cn_id,
            Self::City(c) => c.cn_id,
            Self::District(d) => d.cn_id,
        }
    }

    /// Human-readable area, e.g. `江苏省南京市玄武区`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a parent lookup fails.
    pub async fn area_address(&mut self, pool: &PgPool) -> Result<String, RepositoryError> {
        match self {
            Self::Province(p) => Ok(p.area_address()),
            Self::City(c) => c.area_address(pool).await,
            Self::District(d) => d.area_address(pool).await,
        }
    }

    /// Breadcrumb from the province down to this area.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a parent lookup fails.
    pub async fn grade(&mut self, pool: &PgPool) -> Result<Vec<RegionName>, RepositoryError> {
        match self {
            Self::Province(p) => Ok(p.grade()),
            Self::City(c) => c.grade(pool).await,
            Self::District(d) => d.grade(pool).await,
        }
    }
}
