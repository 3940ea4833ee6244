//! Memo slots for related-row lookups on model instances.
//!
//! A model such as a vendor often needs a related row (its address) or a
//! derived value (its public logo URL) several times while a page renders.
//! Each such attribute is a [`LazyField`] on the model: the first access runs
//! the loader and keeps the result, later accesses reuse it, and
//! [`LazyField::flush`] forces a reload when the row is known to be stale.
//!
//! ```
//! use rosewood_core::LazyField;
//!
//! # tokio_test_block(async {
//! let mut address: LazyField<String> = LazyField::new();
//! let loaded = address
//!     .get_or_flush(|| async { Ok::<_, ()>(Some("No. 8, Xianlie Rd".to_owned())) })
//!     .await;
//! assert_eq!(loaded, Ok(Some(&"No. 8, Xianlie Rd".to_owned())));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! A loader that finds nothing leaves the slot empty, so the next access
//! queries again. Nothing is ever evicted and the slot is not shared between
//! tasks; it lives and dies with the model instance that owns it.

use std::future::Future;

/// A lazily loaded attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyField<T> {
    value: Option<T>,
}

impl<T> Default for LazyField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyField<T> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// A slot that already holds a value (e.g. fetched through a join).
    #[must_use]
    pub const fn loaded(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// The cached value, without loading.
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutable access to the cached value, for models whose own lazy
    /// attributes need loading (a district's city, then that city's province).
    pub const fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Whether a value is cached.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// Forget the cached value.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Replace the cached value.
    pub fn set(&mut self, value: Option<T>) {
        self.value = value;
    }

    /// Take the cached value out, leaving the slot empty.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Run `loader` and overwrite the slot with its result.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; the previous value is kept in that case.
    pub async fn flush<F, Fut, E>(&mut self, loader: F) -> Result<Option<&T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        self.value = loader().await?;
        Ok(self.value.as_ref())
    }

    /// Return the cached value, running `loader` first when the slot is empty.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; the slot stays empty in that case.
    pub async fn get_or_flush<F, Fut, E>(&mut self, loader: F) -> Result<Option<&T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if self.value.is_none() {
            self.value = loader().await?;
        }
        Ok(self.value.as_ref())
    }

    /// Synchronous counterpart of [`get_or_flush`](Self::get_or_flush) for
    /// values derived from the model itself, such as URLs built from paths.
    pub fn get_or_compute<F>(&mut self, compute: F) -> Option<&T>
    where
        F: FnOnce() -> Option<T>,
    {
        if self.value.is_none() {
            self.value = compute();
        }
        self.value.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test]
    async fn test_get_or_flush_loads_once() {
        let calls = Cell::new(0);
        let mut field: LazyField<i32> = LazyField::new();

        for _ in 0..3 {
            let value = field
                .get_or_flush(|| async {
                    calls.set(calls.get() + 1);
                    Ok::<_, ()>(Some(7))
                })
                .await
                .unwrap()
                .copied();
            assert_eq!(value, Some(7));
        }

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_missing_value_is_retried() {
        let calls = Cell::new(0);
        let mut field: LazyField<i32> = LazyField::new();

        for _ in 0..2 {
            let value = field
                .get_or_flush(|| async {
                    calls.set(calls.get() + 1);
                    Ok::<_, ()>(None)
                })
                .await
                .unwrap()
                .copied();
            assert_eq!(value, None);
        }

        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_flush_overwrites() {
        let mut field = LazyField::loaded(String::from("old"));
        let value = field
            .flush(|| async { Ok::<_, ()>(Some(String::from("new"))) })
            .await
            .unwrap()
            .cloned();
        assert_eq!(value.as_deref(), Some("new"));
        assert_eq!(field.get().map(String::as_str), Some("new"));
    }

    #[tokio::test]
    async fn test_error_keeps_previous_value() {
        let mut field = LazyField::loaded(1);
        let result = field.flush(|| async { Err::<Option<i32>, _>("db down") }).await;
        assert_eq!(result, Err("db down"));
        assert_eq!(field.get(), Some(&1));
    }

    #[test]
    fn test_get_or_compute_and_clear() {
        let mut field: LazyField<String> = LazyField::new();
        assert_eq!(
            field.get_or_compute(|| Some("a".to_owned())).map(String::as_str),
            Some("a")
        );
        assert_eq!(
            field.get_or_compute(|| Some("b".to_owned())).map(String::as_str),
            Some("a")
        );
        field.clear();
        assert!(!field.is_loaded());
    }
}
