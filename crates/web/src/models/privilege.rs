//! Administrator accounts.

use chrono::{DateTime, Utc};

use rosewood_core::{AccountKind, Email, PrivilegeId};

use super::Account;

/// An administrator who reviews vendors and revocations.
#[derive(Debug, Clone)]
pub struct Privilege {
    pub id: PrivilegeId,
    pub username: String,
    pub email: Email,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl Account for Privilege {
    const KIND: AccountKind = AccountKind::Privilege;

    fn raw_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn display_name(&self) -> &str {
        &self.username
    }
}
