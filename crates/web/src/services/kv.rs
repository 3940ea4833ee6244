//! In-process key-value store with a TTL per entry.
//!
//! Keys are `(namespace, key)` pairs such as `("vendor_reminds", "42")` or
//! `("confirm_email", <token>)`; values are JSON documents. Entries expire
//! after the TTL given when they were written. Nothing survives a restart.
//!
//! The store holds at most [`MAX_ENTRIES`] entries. Past that bound the
//! least used entries are evicted before their TTL, so a flood of
//! registration emails cannot grow memory without limit.

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Upper bound on stored entries.
pub const MAX_ENTRIES: u64 = 100_000;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum KvError {
    /// A value could not be converted to or from JSON.
    #[error("kv serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KvKey {
    namespace: &'static str,
    key: String,
}

#[derive(Debug, Clone)]
struct KvEntry {
    value: Arc<serde_json::Value>,
    ttl: Option<Duration>,
}

/// Expires each entry after its own TTL.
struct EntryExpiry;

impl Expiry<KvKey, KvEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &KvKey, value: &KvEntry, _created_at: Instant) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &KvKey,
        value: &KvEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Shared handle to the store. Cloning is cheap.
#[derive(Clone)]
pub struct KvStore {
    cache: Cache<KvKey, KvEntry>,
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .expire_after(EntryExpiry)
                .build(),
        }
    }

    /// Store `value` under `namespace`/`key`, replacing any previous value.
    /// `None` keeps the entry until it is deleted or evicted.
    ///
    /// # Errors
    ///
    /// Returns `KvError::Serde` if the value cannot be serialized.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        namespace: &'static str,
        key: impl Display,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), KvError> {
        let entry = KvEntry {
            value: Arc::new(serde_json::to_value(value)?),
            ttl,
        };
        self.cache.insert(Self::key(namespace, key), entry).await;
        Ok(())
    }

    /// Read a value, or `None` if it is missing or expired.
    ///
    /// # Errors
    ///
    /// Returns `KvError::Serde` if the stored JSON does not match `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        namespace: &'static str,
        key: impl Display,
    ) -> Result<Option<T>, KvError> {
        self.cache
            .get(&Self::key(namespace, key))
            .await
            .map(|entry| T::deserialize(entry.value.as_ref()))
            .transpose()
            .map_err(KvError::from)
    }

    /// Remove a value and return it, so it can be used only once.
    ///
    /// # Errors
    ///
    /// Returns `KvError::Serde` if the stored JSON does not match `T`; the
    /// entry is removed regardless.
    pub async fn take<T: DeserializeOwned>(
        &self,
        namespace: &'static str,
        key: impl Display,
    ) -> Result<Option<T>, KvError> {
        self.cache
            .remove(&Self::key(namespace, key))
            .await
            .map(|entry| T::deserialize(entry.value.as_ref()))
            .transpose()
            .map_err(KvError::from)
    }

    /// Remove a value.
    pub async fn delete(&self, namespace: &'static str, key: impl Display) {
        self.cache.invalidate(&Self::key(namespace, key)).await;
    }

    fn key(namespace: &'static str, key: impl Display) -> KvKey {
        KvKey {
            namespace,
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pending {
        email: String,
        action: String,
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let kv = KvStore::new();
        let value = Pending {
            email: "a@example.com".to_owned(),
            action: "register".to_owned(),
        };
        kv.set("confirm_email", "abc", &value, None).await.unwrap();

        let read: Option<Pending> = kv.get("confirm_email", "abc").await.unwrap();
        assert_eq!(read.as_ref(), Some(&value));

        kv.delete("confirm_email", "abc").await;
        let read: Option<Pending> = kv.get("confirm_email", "abc").await.unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let kv = KvStore::new();
        assert_eq!(kv.cache.policy().max_capacity(), Some(MAX_ENTRIES));
    }

    #[tokio::test]
    async fn test_namespaces_are_separate() {
        let kv = KvStore::new();
        kv.set("vendor_reminds", 1, &"vendor", None).await.unwrap();
        kv.set("distributor_reminds", 1, &"distributor", None).await.unwrap();

        let vendor: Option<String> = kv.get("vendor_reminds", 1).await.unwrap();
        let distributor: Option<String> = kv.get("distributor_reminds", 1).await.unwrap();
        assert_eq!(vendor.as_deref(), Some("vendor"));
        assert_eq!(distributor.as_deref(), Some("distributor"));
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let kv = KvStore::new();
        kv.set("confirm_email", "t", &1_u32, None).await.unwrap();
        assert_eq!(kv.take::<u32>("confirm_email", "t").await.unwrap(), Some(1));
        assert_eq!(kv.take::<u32>("confirm_email", "t").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let kv = KvStore::new();
        kv.set("ns", "short", &1_u32, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        kv.set("ns", "long", &2_u32, Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(kv.get::<u32>("ns", "short").await.unwrap(), None);
        assert_eq!(kv.get::<u32>("ns", "long").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_an_error() {
        let kv = KvStore::new();
        kv.set("ns", "k", &"text", None).await.unwrap();
        assert!(kv.get::<u32>("ns", "k").await.is_err());
    }
}
