//! Session-related types.
//!
//! Types stored in the session for authentication and wizard state.

use serde::{Deserialize, Serialize};

use rosewood_core::{AccountId, AccountKind, Email, Mobile};

use super::Account;

/// Session-stored account identity.
///
/// Minimal data stored in the session to identify whoever is logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAccount {
    /// Kind prefix plus row id (`v42`).
    pub id: AccountId,
    /// Name shown in the page header.
    pub name: String,
}

impl CurrentAccount {
    /// Session identity for a freshly authenticated account.
    #[must_use]
    pub fn of<A: Account>(account: &A) -> Self {
        Self {
            id: account.account_id(),
            name: account.display_name().to_owned(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        self.id.kind()
    }
}

/// Where a registration wizard stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RegistrationStep {
    /// Step 0: waiting for a mobile number (or an email for buyers).
    Identity,
    /// Step 1: mobile accepted, waiting for the detail form.
    Details { mobile: Mobile },
}

/// An emailed reset link was followed; the session may set a new password
/// for this account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetGrant {
    pub kind: AccountKind,
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Key for the buyer registration wizard.
    pub const USER_REGISTER: &str = "user_register";

    /// Key for the vendor registration wizard.
    pub const VENDOR_REGISTER: &str = "vendor_register";

    /// Key for a pending password reset.
    pub const PASSWORD_RESET: &str = "password_reset";
}
