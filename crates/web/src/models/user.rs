//! Buyer accounts.

use chrono::{DateTime, Utc};

use rosewood_core::{AccountKind, Email, Mobile, UserId};

use super::Account;

/// A buyer.
///
/// Buyers register with a mobile number or an email address; at least one of
/// the two is always set.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Generated on registration (`用户123456`).
    pub username: String,
    /// Optional display name; never used to log in.
    pub nickname: String,
    pub mobile: Option<Mobile>,
    pub email: Option<Email>,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Contact shown on the profile page: the masked mobile if there is one,
    /// otherwise the email address.
    #[must_use]
    pub fn contact(&self) -> String {
        match (&self.mobile, &self.email) {
            (Some(mobile), _) => mobile.masked(),
            (None, Some(email)) => email.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl Account for User {
    const KIND: AccountKind = AccountKind::User;

    fn raw_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(mobile: Option<&str>, email: Option<&str>) -> User {
        User {
            id: UserId::new(7),
            username: "用户123456".to_owned(),
            nickname: String::new(),
            mobile: mobile.map(|m| Mobile::parse(m).unwrap()),
            email: email.map(|e| Email::parse(e).unwrap()),
            email_confirmed: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contact_prefers_masked_mobile() {
        assert_eq!(
            user(Some("13812345678"), Some("a@example.com")).contact(),
            "138****5678"
        );
        assert_eq!(user(None, Some("a@example.com")).contact(), "a@example.com");
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let mut buyer = user(Some("13812345678"), None);
        assert_eq!(buyer.display_name(), "用户123456");
        buyer.nickname = "13900139000".to_owned();
        assert_eq!(buyer.display_name(), "13900139000");
        assert_eq!(buyer.username, "用户123456");
    }

    #[test]
    fn test_account_id_uses_user_prefix() {
        assert_eq!(user(None, Some("a@example.com")).account_id().to_string(), "u7");
    }
}
