//! Dashboard reminds for vendors and distributors.
//!
//! Reminds live in the key-value store for three days under the account's
//! ID and are overwritten, not appended, by each push.

use std::time::Duration;

use rosewood_core::{DistributorId, RemindStatus, VendorId};

use super::kv::{KvError, KvStore};
use crate::models::{Remind, Reminds};

/// Namespace of vendor reminds.
pub const VENDOR_REMINDS: &str = "vendor_reminds";

/// Namespace of distributor reminds.
pub const DISTRIBUTOR_REMINDS: &str = "distributor_reminds";

/// How long a remind stays visible.
pub const REMIND_TTL: Duration = Duration::from_secs(3 * 24 * 3600);

/// Path of the form a rejected vendor resubmits.
pub const RECONFIRM_PATH: &str = "/vendor/reconfirm";

/// The verification remind for a vendor.
#[must_use]
pub fn vendor_confirm_remind(status: RemindStatus, reject_message: &str) -> Remind {
    match status {
        RemindStatus::Success => Remind::new(
            status,
            "Your verification has been approved. Start uploading your items!",
        ),
        RemindStatus::Warning => Remind::new(
            status,
            "Your verification details will be reviewed within 3 business days.",
        ),
        RemindStatus::Danger => Remind::new(
            status,
            format!("Your verification was not approved. {reject_message}")
                .trim_end()
                .to_owned(),
        )
        .with_link("Resubmit", RECONFIRM_PATH),
    }
}

/// The welcome remind for a new distributor.
#[must_use]
pub fn distributor_register_remind(username: &str) -> Remind {
    Remind::new(
        RemindStatus::Warning,
        format!("Please remember your login username: {username}"),
    )
}

/// Reads and writes reminds.
pub struct RemindService<'a> {
    kv: &'a KvStore,
}

impl<'a> RemindService<'a> {
    #[must_use]
    pub const fn new(kv: &'a KvStore) -> Self {
        Self { kv }
    }

    /// Replace a vendor's reminds with its verification status.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the reminds cannot be serialized.
    pub async fn push_vendor_confirm(
        &self,
        vendor_id: VendorId,
        status: RemindStatus,
        reject_message: &str,
    ) -> Result<(), KvError> {
        let reminds = single("confirm", vendor_confirm_remind(status, reject_message));
        self.kv
            .set(VENDOR_REMINDS, vendor_id, &reminds, Some(REMIND_TTL))
            .await
    }

    /// Replace a distributor's reminds with its login username.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the reminds cannot be serialized.
    pub async fn push_distributor_register(
        &self,
        distributor_id: DistributorId,
        username: &str,
    ) -> Result<(), KvError> {
        let reminds = single("confirm", distributor_register_remind(username));
        self.kv
            .set(DISTRIBUTOR_REMINDS, distributor_id, &reminds, Some(REMIND_TTL))
            .await
    }

    /// A vendor's reminds; empty when none were pushed or they expired.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the stored JSON is not a reminds document.
    pub async fn vendor_reminds(&self, vendor_id: VendorId) -> Result<Reminds, KvError> {
        Ok(self.kv.get(VENDOR_REMINDS, vendor_id).await?.unwrap_or_default())
    }

    /// A distributor's reminds; empty when none were pushed or they expired.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the stored JSON is not a reminds document.
    pub async fn distributor_reminds(&self, distributor_id: DistributorId) -> Result<Reminds, KvError> {
        Ok(self
            .kv
            .get(DISTRIBUTOR_REMINDS, distributor_id)
            .await?
            .unwrap_or_default())
    }
}

fn single(topic: &str, remind: Remind) -> Reminds {
    let mut reminds = Reminds::new();
    reminds.insert(topic.to_owned(), vec![remind]);
    reminds
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_confirm_messages() {
        let success = vendor_confirm_remind(RemindStatus::Success, "ignored");
        assert_eq!(success.status, RemindStatus::Success);
        assert!(success.link.is_none());

        let warning = vendor_confirm_remind(RemindStatus::Warning, "");
        assert!(warning.message.contains("3 business days"));

        let danger = vendor_confirm_remind(RemindStatus::Danger, "licence photo is blurry");
        assert!(danger.message.ends_with("licence photo is blurry"));
        let link = danger.link.unwrap();
        assert_eq!(link.href, "/vendor/reconfirm");
    }

    #[tokio::test]
    async fn test_push_and_read_vendor_reminds() {
        let kv = KvStore::new();
        let reminds = RemindService::new(&kv);
        let vendor = VendorId::new(42);

        assert!(reminds.vendor_reminds(vendor).await.unwrap().is_empty());

        reminds
            .push_vendor_confirm(vendor, RemindStatus::Warning, "")
            .await
            .unwrap();
        reminds
            .push_vendor_confirm(vendor, RemindStatus::Danger, "missing licence")
            .await
            .unwrap();

        let read = reminds.vendor_reminds(vendor).await.unwrap();
        let confirm = &read["confirm"];
        assert_eq!(confirm.len(), 1);
        assert_eq!(confirm[0].status, RemindStatus::Danger);
    }

    #[tokio::test]
    async fn test_distributor_reminds_are_separate() {
        let kv = KvStore::new();
        let reminds = RemindService::new(&kv);

        reminds
            .push_distributor_register(DistributorId::new(42), "12345678")
            .await
            .unwrap();

        assert!(reminds.vendor_reminds(VendorId::new(42)).await.unwrap().is_empty());
        let read = reminds.distributor_reminds(DistributorId::new(42)).await.unwrap();
        assert!(read["confirm"][0].message.contains("12345678"));
    }
}
