//! Status enums for the account workflows.

use serde::{Deserialize, Serialize};

/// Severity of a remind message, used as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemindStatus {
    Success,
    Warning,
    Danger,
}

impl RemindStatus {
    /// Lowercase name as stored in the remind JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl std::fmt::Display for RemindStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a vendor stands in identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Submitted, waiting for an administrator.
    Pending,
    /// Approved; the vendor may upload items.
    Confirmed,
    /// Turned down; the vendor has to resubmit.
    Rejected,
}

impl VerificationStatus {
    /// Derive the status from the `confirmed` / `rejected` columns.
    #[must_use]
    pub const fn from_flags(confirmed: bool, rejected: bool) -> Self {
        match (confirmed, rejected) {
            (true, _) => Self::Confirmed,
            (false, true) => Self::Rejected,
            (false, false) => Self::Pending,
        }
    }
}

/// Progress of a distributor's contract termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationState {
    /// No revocation was ever filed.
    #[default]
    None,
    /// Filed and waiting for review.
    Pending,
    /// Approved; the distributor is revoked.
    Revoked,
    /// Reviewed and turned down.
    Rejected,
}

impl RevocationState {
    /// Derive the state from an optional revocation row's flags.
    #[must_use]
    pub const fn from_row(row: Option<(bool, bool)>) -> Self {
        match row {
            None => Self::None,
            Some((true, _)) => Self::Pending,
            Some((false, true)) => Self::Revoked,
            Some((false, false)) => Self::Rejected,
        }
    }

    /// Name shown in templates; empty when nothing was filed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Pending => "pending",
            Self::Revoked => "revoked",
            Self::Rejected => "rejected",
        }
    }
}

/// What an emailed confirmation link does once followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    /// Create the account registered by email.
    Register,
    /// Allow the session to set a new password.
    ResetPassword,
}

impl ConfirmAction {
    /// Value of the `action` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::ResetPassword => "reset_password",
        }
    }
}

impl std::str::FromStr for ConfirmAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(Self::Register),
            "reset_password" => Ok(Self::ResetPassword),
            _ => Err(format!("invalid confirm action: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_from_flags() {
        assert_eq!(
            VerificationStatus::from_flags(false, false),
            VerificationStatus::Pending
        );
        assert_eq!(
            VerificationStatus::from_flags(true, false),
            VerificationStatus::Confirmed
        );
        assert_eq!(
            VerificationStatus::from_flags(false, true),
            VerificationStatus::Rejected
        );
    }

    #[test]
    fn test_revocation_state() {
        assert_eq!(RevocationState::from_row(None).as_str(), "");
        assert_eq!(
            RevocationState::from_row(Some((true, false))),
            RevocationState::Pending
        );
        assert_eq!(
            RevocationState::from_row(Some((false, true))),
            RevocationState::Revoked
        );
        assert_eq!(
            RevocationState::from_row(Some((false, false))).as_str(),
            "rejected"
        );
    }

    #[test]
    fn test_confirm_action_round_trip() {
        for action in [ConfirmAction::Register, ConfirmAction::ResetPassword] {
            assert_eq!(action.as_str().parse::<ConfirmAction>(), Ok(action));
        }
        assert!("delete".parse::<ConfirmAction>().is_err());
    }

    #[test]
    fn test_remind_status_json() {
        assert_eq!(
            serde_json::to_string(&RemindStatus::Warning).ok().as_deref(),
            Some("\"warning\"")
        );
    }
}
