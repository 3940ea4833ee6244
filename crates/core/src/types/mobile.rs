//! Mainland mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Mobile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The number does not have exactly 11 characters.
    #[error("mobile number must have 11 digits")]
    Length,
    /// The number contains something other than ASCII digits.
    #[error("mobile number must contain only digits")]
    NotDigits,
    /// The number does not start with a valid carrier prefix (13x-19x).
    #[error("mobile number must start with 13-19")]
    Prefix,
}

/// An 11-digit mobile number (`CHAR(11)` columns).
///
/// ```
/// use rosewood_core::Mobile;
///
/// assert!(Mobile::parse("13812345678").is_ok());
/// assert!(Mobile::parse("12812345678").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Mobile(String);

impl Mobile {
    /// Number of digits in a mobile number.
    pub const LENGTH: usize = 11;

    /// Parse a mobile number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is not 11 ASCII digits starting with
    /// `13` through `19`.
    pub fn parse(s: &str) -> Result<Self, MobileError> {
        let s = s.trim();
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MobileError::NotDigits);
        }
        if s.len() != Self::LENGTH {
            return Err(MobileError::Length);
        }
        match s.as_bytes() {
            [b'1', b'3'..=b'9', ..] => Ok(Self(s.to_owned())),
            _ => Err(MobileError::Prefix),
        }
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number with the middle four digits hidden (`138****5678`).
    #[must_use]
    pub fn masked(&self) -> String {
        let head = self.0.get(..3).unwrap_or_default();
        let tail = self.0.get(7..).unwrap_or_default();
        format!("{head}****{tail}")
    }
}

impl fmt::Display for Mobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Mobile {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Mobile {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Mobile {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let mobile = Mobile::parse(" 13812345678 ").unwrap();
        assert_eq!(mobile.as_str(), "13812345678");
        assert!(Mobile::parse("19900000000").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Mobile::parse("1381234567"), Err(MobileError::Length));
        assert_eq!(Mobile::parse("138123456789"), Err(MobileError::Length));
        assert_eq!(Mobile::parse("1381234567a"), Err(MobileError::NotDigits));
        assert_eq!(Mobile::parse("12812345678"), Err(MobileError::Prefix));
        assert_eq!(Mobile::parse("23812345678"), Err(MobileError::Prefix));
    }

    #[test]
    fn test_masked() {
        let mobile = Mobile::parse("13812345678").unwrap();
        assert_eq!(mobile.masked(), "138****5678");
    }
}
