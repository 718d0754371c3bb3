//! Cache Handle Module
//!
//! Shared, cloneable access to a cache instance with typed and async forms.

use std::any::{type_name, Any};
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{Cache, CacheValue};
use crate::config::{Cacheable, PolicyKind};
use crate::error::{CacheError, Result};

// == Cache Handle ==
/// Reference to a cache instance handed out by the registry.
///
/// Clones share the same instance. Each `*_async` method evaluates the
/// operation when called and returns an already completed future, so the
/// async forms observe exactly what the direct forms would at that moment.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    inner: Arc<dyn Cache>,
}

impl CacheHandle {
    pub fn new<C: Cache + 'static>(cache: C) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.inner.kind()
    }

    /// True if both handles point at the same cache instance.
    pub fn same_instance(&self, other: &CacheHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // == Get ==
    /// Returns the untyped payload for a live key.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.inner.get(key)
    }

    /// Returns a clone of the stored value if it is live and of type `T`.
    ///
    /// A value of any other type is reported as a miss.
    pub fn get_typed<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.try_get_typed(key).unwrap_or_else(|err| {
            debug!(%err, "Typed lookup treated as miss");
            None
        })
    }

    /// Like [`get_typed`](Self::get_typed), but reports a type mismatch.
    ///
    /// # Errors
    /// - `TypeMismatch` if the key is live but holds a different type
    pub fn try_get_typed<T: Any + Clone>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.inner.get(key) else {
            return Ok(None);
        };

        match (*value).downcast_ref::<T>() {
            Some(typed) => Ok(Some(typed.clone())),
            None => Err(CacheError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            }),
        }
    }

    // == Set ==
    /// Stores an untyped payload. `ttl` falls back to the instance default.
    pub fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        self.inner.set(key, value, ttl);
    }

    pub fn set_typed<T: Any + Send + Sync>(&self, key: &str, value: T, ttl: Option<Duration>) {
        self.inner.set(key, Arc::new(value), ttl);
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.exists(key)
    }

    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    /// Stored entries, counting expired ones not purged yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Releases background resources of the instance. Safe to call repeatedly.
    pub fn close(&self) {
        self.inner.close();
    }

    /// False for a TTL instance whose sweeper has been closed.
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    // == Cacheable ==
    /// Stores a [`Cacheable`] value under its declared key and expiry.
    pub fn store_cacheable<T: Cacheable + Any + Send + Sync>(&self, value: T) {
        self.set_typed(T::CACHE_KEY, value, T::TIME_TO_LIVE);
    }

    pub fn fetch_cacheable<T: Cacheable + Any + Clone>(&self) -> Option<T> {
        self.get_typed(T::CACHE_KEY)
    }

    // == Async Forms ==
    pub fn get_async(&self, key: &str) -> Ready<Option<CacheValue>> {
        ready(self.get(key))
    }

    pub fn get_typed_async<T: Any + Clone>(&self, key: &str) -> Ready<Option<T>> {
        ready(self.get_typed(key))
    }

    pub fn set_async(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Ready<()> {
        self.set(key, value, ttl);
        ready(())
    }

    pub fn set_typed_async<T: Any + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl: Option<Duration>,
    ) -> Ready<()> {
        self.set_typed(key, value, ttl);
        ready(())
    }

    pub fn exists_async(&self, key: &str) -> Ready<bool> {
        ready(self.exists(key))
    }

    pub fn remove_async(&self, key: &str) -> Ready<()> {
        self.remove(key);
        ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BasicCache, LruCache};
    use tokio_test::{assert_ready, assert_ready_eq, task};

    #[derive(Debug, Clone, PartialEq)]
    struct Profile {
        name: String,
    }

    impl Cacheable for Profile {
        const CACHE_KEY: &'static str = "profile";
        const TIME_TO_LIVE: Option<Duration> = Some(Duration::from_millis(30));
    }

    fn basic() -> CacheHandle {
        CacheHandle::new(BasicCache::new(16, None))
    }

    #[test]
    fn test_typed_roundtrip() {
        let cache = basic();

        cache.set_typed("answer", 42u32, None);
        assert_eq!(cache.get_typed::<u32>("answer"), Some(42));
        assert!(cache.get("answer").is_some());
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = basic();

        cache.set_typed("answer", 42u32, None);

        assert_eq!(cache.get_typed::<String>("answer"), None);
        assert!(matches!(
            cache.try_get_typed::<i64>("answer"),
            Err(CacheError::TypeMismatch { ref key, .. }) if key == "answer"
        ));
        // The stored value is untouched
        assert_eq!(cache.get_typed::<u32>("answer"), Some(42));
    }

    #[test]
    fn test_try_get_typed_missing_key() {
        let cache = basic();
        assert!(matches!(cache.try_get_typed::<u32>("nope"), Ok(None)));
    }

    #[test]
    fn test_clones_share_instance() {
        let cache = basic();
        let other = cache.clone();

        other.set_typed("k", "v".to_string(), None);

        assert!(cache.same_instance(&other));
        assert_eq!(cache.get_typed::<String>("k").as_deref(), Some("v"));
        assert!(!cache.same_instance(&basic()));
    }

    #[test]
    fn test_cacheable_uses_declared_key_and_ttl() {
        let cache = basic();

        cache.store_cacheable(Profile {
            name: "ada".to_string(),
        });

        assert!(cache.exists("profile"));
        assert_eq!(
            cache.fetch_cacheable::<Profile>(),
            Some(Profile {
                name: "ada".to_string()
            })
        );

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.fetch_cacheable::<Profile>(), None);
    }

    #[test]
    fn test_async_forms_are_ready_immediately() {
        let cache = basic();

        let mut set = task::spawn(cache.set_typed_async("k", 7i32, None));
        assert_ready!(set.poll());

        let mut get = task::spawn(cache.get_typed_async::<i32>("k"));
        assert_ready_eq!(get.poll(), Some(7));

        let mut exists = task::spawn(cache.exists_async("k"));
        assert_ready_eq!(exists.poll(), true);
    }

    #[test]
    fn test_async_form_reflects_call_time_state() {
        let cache = basic();
        cache.set_typed("k", 1i32, None);

        let pending_read = cache.get_typed_async::<i32>("k");
        cache.set_typed("k", 2i32, None);

        let mut read = task::spawn(pending_read);
        assert_ready_eq!(read.poll(), Some(1));
    }

    #[tokio::test]
    async fn test_async_forms_match_direct_forms() {
        let cache = CacheHandle::new(LruCache::new(4, 2, None).unwrap());

        cache.set_async("a", Arc::new(1u8), None).await;
        cache.set_typed_async("b", 2u8, None).await;
        assert!(cache.get_async("a").await.is_some());
        cache.set_typed_async("c", 3u8, None).await;

        assert!(!cache.exists_async("b").await);
        assert_eq!(cache.get_typed_async::<u8>("c").await, Some(3));

        cache.remove_async("c").await;
        assert!(!cache.exists("c"));
        assert_eq!(cache.len(), 1);
    }
}
