//! Province / city / district reference data.
//!
//! The administrative division table ships inside the binary
//! (`data/regions.tsv`: six-digit code, tab, name). [`plan`] turns the flat
//! table into an ordered list of records whose parents always come before
//! their children, which is what the seed loader inserts.
//!
//! Classification follows the code layout: `xx0000` is a province, `xxxx00`
//! a prefecture-level city and anything else a district or county.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The embedded division table.
pub const REGION_TABLE: &str = include_str!("../data/regions.tsv");

/// Provinces that are cities themselves.
pub const MUNICIPALITIES: [&str; 4] = ["北京市", "天津市", "上海市", "重庆市"];

/// Placeholder name used by the table for "urban districts of ...".
const URBAN_DISTRICTS: &str = "市辖区";

/// Placeholder name used by the table for "counties of ...".
const COUNTIES: &str = "县";

/// Errors raised while reading the division table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// A line is not `code<TAB>name`.
    #[error("line {line}: expected `code<TAB>name`")]
    Malformed { line: usize },
    /// A code is not six digits.
    #[error("line {line}: invalid region code {code:?}")]
    InvalidCode { line: usize, code: String },
    /// A city or district appears before any parent.
    #[error("region {code} has no parent")]
    Orphan { code: u32 },
}

/// Level of an administrative division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLevel {
    Province,
    City,
    District,
}

/// A six-digit administrative division code (the `cn_id` columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(u32);

impl RegionCode {
    /// Parse a six-digit code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(Self)
    }

    /// Wrap a code read from the database.
    #[must_use]
    pub const fn from_i32(code: i32) -> Option<Self> {
        if code >= 100_000 && code <= 999_999 {
            #[allow(clippy::cast_sign_loss)] // checked positive above
            Some(Self(code as u32))
        } else {
            None
        }
    }

    /// The raw code.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The code as stored in `INTEGER` columns.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // six digits always fit
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    /// Level implied by the trailing zeros.
    #[must_use]
    pub const fn level(self) -> RegionLevel {
        if self.0 % 10_000 == 0 {
            RegionLevel::Province
        } else if self.0 % 100 == 0 {
            RegionLevel::City
        } else {
            RegionLevel::District
        }
    }

    /// Code of the enclosing province.
    #[must_use]
    pub const fn province(self) -> Self {
        Self(self.0 - self.0 % 10_000)
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

/// One line of the division table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRow<'a> {
    pub code: RegionCode,
    pub name: &'a str,
}

/// Parse a division table.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_table(table: &str) -> Result<Vec<RegionRow<'_>>, RegionError> {
    table
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let line_no = i + 1;
            let (code, name) = line
                .split_once('\t')
                .ok_or(RegionError::Malformed { line: line_no })?;
            let code = RegionCode::parse(code.trim()).ok_or_else(|| RegionError::InvalidCode {
                line: line_no,
                code: code.to_owned(),
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(RegionError::Malformed { line: line_no });
            }
            Ok(RegionRow { code, name })
        })
        .collect()
}

/// A division to insert, with the code of its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub level: RegionLevel,
    pub code: RegionCode,
    pub name: String,
    pub parent: Option<RegionCode>,
}

/// Turn table rows into insertable records.
///
/// - city rows named `市辖区` become a city named after the province when the
///   province is a municipality, and are dropped otherwise;
/// - city rows named `县` are dropped;
/// - district rows named `市辖区` are dropped;
/// - districts attach to the most recent kept city.
///
/// # Errors
///
/// Returns [`RegionError::Orphan`] for a city before any province or a
/// district before any city of the current province.
pub fn plan(rows: &[RegionRow<'_>]) -> Result<Vec<RegionRecord>, RegionError> {
    let mut records = Vec::with_capacity(rows.len());
    let mut province: Option<(RegionCode, &str)> = None;
    let mut city: Option<RegionCode> = None;

    for row in rows {
        match row.code.level() {
            RegionLevel::Province => {
                province = Some((row.code, row.name));
                city = None;
                records.push(RegionRecord {
                    level: RegionLevel::Province,
                    code: row.code,
                    name: row.name.to_owned(),
                    parent: None,
                });
            }
            RegionLevel::City => {
                let (province_code, province_name) =
                    province.ok_or(RegionError::Orphan { code: row.code.get() })?;
                let name = match row.name {
                    URBAN_DISTRICTS if is_municipality(province_name) => province_name,
                    URBAN_DISTRICTS | COUNTIES => continue,
                    name => name,
                };
                city = Some(row.code);
                records.push(RegionRecord {
                    level: RegionLevel::City,
                    code: row.code,
                    name: name.to_owned(),
                    parent: Some(province_code),
                });
            }
            RegionLevel::District => {
                if row.name == URBAN_DISTRICTS {
                    continue;
                }
                let parent = city
                    .filter(|c| c.province() == row.code.province())
                    .ok_or(RegionError::Orphan { code: row.code.get() })?;
                records.push(RegionRecord {
                    level: RegionLevel::District,
                    code: row.code,
                    name: row.name.to_owned(),
                    parent: Some(parent),
                });
            }
        }
    }

    Ok(records)
}

/// Plan the embedded table.
///
/// # Errors
///
/// Only fails if the embedded table is corrupt.
pub fn embedded_plan() -> Result<Vec<RegionRecord>, RegionError> {
    plan(&parse_table(REGION_TABLE)?)
}

/// Whether a province name is one of the four municipalities.
#[must_use]
pub fn is_municipality(name: &str) -> bool {
    MUNICIPALITIES.contains(&name)
}

/// Human-readable area of a city: the city alone for municipalities,
/// otherwise province followed by city.
#[must_use]
pub fn city_area_address(province: &str, city: &str) -> String {
    if is_municipality(city) {
        city.to_owned()
    } else {
        format!("{province}{city}")
    }
}

/// Human-readable area of a district.
#[must_use]
pub fn district_area_address(province: &str, city: &str, district: &str) -> String {
    format!("{}{district}", city_area_address(province, city))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn count(records: &[RegionRecord], level: RegionLevel) -> usize {
        records.iter().filter(|r| r.level == level).count()
    }

    #[test]
    fn test_code_levels() {
        assert_eq!(RegionCode::parse("110000").unwrap().level(), RegionLevel::Province);
        assert_eq!(RegionCode::parse("320100").unwrap().level(), RegionLevel::City);
        assert_eq!(RegionCode::parse("320102").unwrap().level(), RegionLevel::District);
        assert_eq!(
            RegionCode::parse("320102").unwrap().province(),
            RegionCode::parse("320000").unwrap()
        );
        assert!(RegionCode::parse("32010").is_none());
        assert!(RegionCode::parse("32010a").is_none());
        assert_eq!(RegionCode::from_i32(320_102).map(RegionCode::as_i32), Some(320_102));
        assert!(RegionCode::from_i32(12).is_none());
    }

    #[test]
    fn test_parse_table_errors() {
        assert_eq!(
            parse_table("110000 北京市"),
            Err(RegionError::Malformed { line: 1 })
        );
        assert!(matches!(
            parse_table("110000\t北京市\n1100\t市辖区"),
            Err(RegionError::InvalidCode { line: 2, .. })
        ));
    }

    #[test]
    fn test_municipality_urban_districts_become_city() {
        let rows = parse_table("110000\t北京市\n110100\t市辖区\n110101\t东城区\n110200\t县\n110228\t密云县").unwrap();
        let records = plan(&rows).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].name, "北京市");
        assert_eq!(records[1].level, RegionLevel::City);
        // Counties after the skipped "县" row stay under the kept city.
        assert_eq!(records[3].parent, RegionCode::parse("110100"));
    }

    #[test]
    fn test_placeholder_districts_are_skipped() {
        let rows = parse_table("320000\t江苏省\n320100\t南京市\n320101\t市辖区\n320102\t玄武区").unwrap();
        let records = plan(&rows).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["江苏省", "南京市", "玄武区"]);
    }

    #[test]
    fn test_non_municipal_urban_city_is_skipped() {
        let rows = parse_table("320000\t江苏省\n320100\t市辖区").unwrap();
        let records = plan(&rows).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_orphans_are_rejected() {
        let rows = parse_table("320100\t南京市").unwrap();
        assert_eq!(plan(&rows), Err(RegionError::Orphan { code: 320_100 }));

        let rows = parse_table("320000\t江苏省\n320100\t南京市\n330102\t上城区").unwrap();
        assert_eq!(plan(&rows), Err(RegionError::Orphan { code: 330_102 }));
    }

    #[test]
    fn test_embedded_table() {
        let records = embedded_plan().unwrap();
        assert_eq!(count(&records, RegionLevel::Province), 34);
        assert_eq!(count(&records, RegionLevel::City), 341);
        assert_eq!(count(&records, RegionLevel::District), 2855);
        // Parents always precede children.
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if let Some(parent) = record.parent {
                assert!(seen.contains(&parent), "{} before parent", record.code);
            }
            seen.insert(record.code);
        }
    }

    #[test]
    fn test_area_addresses() {
        assert_eq!(city_area_address("北京市", "北京市"), "北京市");
        assert_eq!(city_area_address("江苏省", "南京市"), "江苏省南京市");
        assert_eq!(
            district_area_address("江苏省", "南京市", "玄武区"),
            "江苏省南京市玄武区"
        );
        assert_eq!(district_area_address("上海市", "上海市", "黄浦区"), "上海市黄浦区");
    }
}
