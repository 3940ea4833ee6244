//! Account kinds and the session identity string.
//!
//! The marketplace has four separate account tables. A logged-in session
//! stores a single string made of a one-character kind prefix followed by
//! the row id (`u12`, `v3`, `d805`, `p1`), so one cookie can identify any of
//! them.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{DistributorId, PrivilegeId, UserId, VendorId};

/// The four account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Buyer.
    User,
    /// Furniture manufacturer.
    Vendor,
    /// Reseller bound to a vendor.
    Distributor,
    /// Administrator.
    Privilege,
}

impl AccountKind {
    /// All kinds, in prefix lookup order.
    pub const ALL: [Self; 4] = [Self::Privilege, Self::Vendor, Self::Distributor, Self::User];

    /// Session-id prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::User => 'u',
            Self::Vendor => 'v',
            Self::Distributor => 'd',
            Self::Privilege => 'p',
        }
    }

    /// Route segment the kind's pages live under.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Vendor => "vendor",
            Self::Distributor => "distributor",
            Self::Privilege => "privilege",
        }
    }

    /// Kind for a session-id prefix. Unknown prefixes resolve to `User`.
    #[must_use]
    pub fn from_prefix(prefix: char) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.prefix() == prefix)
            .unwrap_or(Self::User)
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Errors that can occur when parsing an [`AccountId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    /// The string is empty or has no id after the prefix.
    #[error("account id is empty")]
    Empty,
    /// The part after the prefix is not a number.
    #[error("account id must be a prefix followed by a number")]
    NotNumeric,
}

/// Session identity of any account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    kind: AccountKind,
    id: i32,
}

impl AccountId {
    /// Build an identity from a kind and a row id.
    #[must_use]
    pub const fn new(kind: AccountKind, id: i32) -> Self {
        Self { kind, id }
    }

    /// The account kind.
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        self.kind
    }

    /// The raw row id.
    #[must_use]
    pub const fn raw_id(&self) -> i32 {
        self.id
    }

    /// The user id, when this identity belongs to a user.
    #[must_use]
    pub const fn user(&self) -> Option<UserId> {
        match self.kind {
            AccountKind::User => Some(UserId::new(self.id)),
            _ => None,
        }
    }

    /// The vendor id, when this identity belongs to a vendor.
    #[must_use]
    pub const fn vendor(&self) -> Option<VendorId> {
        match self.kind {
            AccountKind::Vendor => Some(VendorId::new(self.id)),
            _ => None,
        }
    }

    /// The distributor id, when this identity belongs to a distributor.
    #[must_use]
    pub const fn distributor(&self) -> Option<DistributorId> {
        match self.kind {
            AccountKind::Distributor => Some(DistributorId::new(self.id)),
            _ => None,
        }
    }

    /// The privilege id, when this identity belongs to an administrator.
    #[must_use]
    pub const fn privilege(&self) -> Option<PrivilegeId> {
        match self.kind {
            AccountKind::Privilege => Some(PrivilegeId::new(self.id)),
            _ => None,
        }
    }
}

impl From<UserId> for AccountId {
    fn from(id: UserId) -> Self {
        Self::new(AccountKind::User, id.as_i32())
    }
}

impl From<VendorId> for AccountId {
    fn from(id: VendorId) -> Self {
        Self::new(AccountKind::Vendor, id.as_i32())
    }
}

impl From<DistributorId> for AccountId {
    fn from(id: DistributorId) -> Self {
        Self::new(AccountKind::Distributor, id.as_i32())
    }
}

impl From<PrivilegeId> for AccountId {
    fn from(id: PrivilegeId) -> Self {
        Self::new(AccountKind::Privilege, id.as_i32())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let prefix = chars.next().ok_or(AccountIdError::Empty)?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return Err(AccountIdError::Empty);
        }
        let id = rest.parse::<i32>().map_err(|_| AccountIdError::NotNumeric)?;
        Ok(Self::new(AccountKind::from_prefix(prefix), id))
    }
}

impl Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_prefix() {
        assert_eq!(AccountId::from(VendorId::new(42)).to_string(), "v42");
        assert_eq!(AccountId::from(UserId::new(1)).to_string(), "u1");
        assert_eq!(AccountId::from(DistributorId::new(7)).to_string(), "d7");
        assert_eq!(AccountId::from(PrivilegeId::new(3)).to_string(), "p3");
    }

    #[test]
    fn test_parse_dispatches_on_prefix() {
        let id: AccountId = "d805".parse().unwrap();
        assert_eq!(id.kind(), AccountKind::Distributor);
        assert_eq!(id.distributor(), Some(DistributorId::new(805)));
        assert_eq!(id.vendor(), None);
    }

    #[test]
    fn test_unknown_prefix_is_user() {
        let id: AccountId = "x15".parse().unwrap();
        assert_eq!(id.user(), Some(UserId::new(15)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<AccountId>(), Err(AccountIdError::Empty));
        assert_eq!("v".parse::<AccountId>(), Err(AccountIdError::Empty));
        assert_eq!("vabc".parse::<AccountId>(), Err(AccountIdError::NotNumeric));
    }

    #[test]
    fn test_serde_as_string() {
        let id = AccountId::from(PrivilegeId::new(2));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p2\"");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
