//! Transient notifications shown on an account's dashboard.
//!
//! Reminds are JSON documents in the key-value store, grouped by topic:
//!
//! ```json
//! {"confirm": [{"message": "...", "type": "danger",
//!               "link": {"text": "Resubmit", "href": "/vendor/reconfirm"}}]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rosewood_core::RemindStatus;

/// Reminds grouped by topic; verification and welcome reminds both use
/// `confirm`.
pub type Reminds = BTreeMap<String, Vec<Remind>>;

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remind {
    pub message: String,
    #[serde(rename = "type")]
    pub status: RemindStatus,
    #[serde(default)]
    pub link: Option<RemindLink>,
}

/// A call to action attached to a remind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemindLink {
    pub text: String,
    pub href: String,
}

impl Remind {
    #[must_use]
    pub fn new(status: RemindStatus, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            link: None,
        }
    }

    #[must_use]
    pub fn with_link(mut self, text: impl Into<String>, href: impl Into<String>) -> Self {
        self.link = Some(RemindLink {
            text: text.into(),
            href: href.into(),
        });
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut reminds = Reminds::new();
        reminds.insert(
            "confirm".to_owned(),
            vec![
                Remind::new(RemindStatus::Danger, "rejected")
                    .with_link("Resubmit", "/vendor/reconfirm"),
            ],
        );
        let json = serde_json::to_value(&reminds).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"confirm": [{
                "message": "rejected",
                "type": "danger",
                "link": {"text": "Resubmit", "href": "/vendor/reconfirm"}
            }]})
        );
    }

    #[test]
    fn test_missing_link_is_null() {
        let json = serde_json::to_value(Remind::new(RemindStatus::Warning, "hi")).unwrap();
        assert_eq!(json["link"], serde_json::Value::Null);
    }

    #[test]
    fn test_link_is_optional() {
        let remind: Remind =
            serde_json::from_str(r#"{"message": "hello", "type": "warning"}"#).unwrap();
        assert_eq!(remind, Remind::new(RemindStatus::Warning, "hello"));
    }
}
