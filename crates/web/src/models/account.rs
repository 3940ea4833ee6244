//! Behaviour shared by the four account kinds.

use rosewood_core::{AccountId, AccountKind};

/// An account that can log in.
///
/// Each kind lives in its own table; the session stores the
/// [`AccountId`] (kind prefix plus row id) and the loader dispatches on the
/// prefix.
pub trait Account {
    /// Which table the account lives in.
    const KIND: AccountKind;

    /// Row id in that table.
    fn raw_id(&self) -> i32;

    /// Name shown in the page header.
    fn display_name(&self) -> &str;

    /// Session identity (`u7`, `v42`, ...).
    fn account_id(&self) -> AccountId {
        AccountId::new(Self::KIND, self.raw_id())
    }
}
