//! Fixed-prefix namespacing over a session store

use crate::SessionStore;
use std::sync::Arc;

/// Default namespace prefix for all AuthRelay cache entries.
pub const DEFAULT_CACHE_PREFIX: &str = "AuthRelayCache#";

/// Thin namespaced wrapper over a [`SessionStore`].
///
/// Every key is prefixed so flow state and tokens never collide with
/// unrelated session data, and so the whole namespace can be enumerated and
/// cleared in one pass. The wrapper is oblivious to key semantics.
#[derive(Clone)]
pub struct ScopedCache {
    store: Arc<dyn SessionStore>,
    prefix: String,
}

impl ScopedCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_prefix(store, DEFAULT_CACHE_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn SessionStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.store.get(&format!("{}{}", self.prefix, name))
    }

    pub fn set(&self, name: &str, value: &str) {
        self.store.set(&format!("{}{}", self.prefix, name), value);
    }

    pub fn remove(&self, name: &str) {
        self.store.remove(&format!("{}{}", self.prefix, name));
    }

    /// Enumerate the scoped key names (prefix stripped). No ordering
    /// guarantee.
    pub fn keys(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    /// Remove every entry under this namespace.
    pub fn clear(&self) {
        for name in self.keys() {
            self.remove(&name);
        }
    }
}

impl std::fmt::Debug for ScopedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCache")
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySessionStore;

    fn cache_over(store: &Arc<MemorySessionStore>) -> ScopedCache {
        ScopedCache::new(Arc::clone(store) as Arc<dyn SessionStore>)
    }

    #[test]
    fn test_keys_are_prefixed_in_backing_store() {
        let store = Arc::new(MemorySessionStore::new());
        let cache = cache_over(&store);

        cache.set("RefreshToken", "rt");
        assert_eq!(
            store.get("AuthRelayCache#RefreshToken"),
            Some("rt".to_string())
        );
        assert_eq!(cache.get("RefreshToken"), Some("rt".to_string()));
    }

    #[test]
    fn test_enumeration_skips_foreign_keys() {
        let store = Arc::new(MemorySessionStore::new());
        let cache = cache_over(&store);

        store.set("UnrelatedSessionValue", "x");
        cache.set("TenantId", "contoso");

        assert_eq!(cache.keys(), vec!["TenantId".to_string()]);
    }

    #[test]
    fn test_clear_leaves_foreign_keys_alone() {
        let store = Arc::new(MemorySessionStore::new());
        let cache = cache_over(&store);

        store.set("UnrelatedSessionValue", "x");
        cache.set("TenantId", "contoso");
        cache.set("RefreshToken", "rt");

        cache.clear();

        assert!(cache.keys().is_empty());
        assert_eq!(store.get("UnrelatedSessionValue"), Some("x".to_string()));
    }

    #[test]
    fn test_custom_prefix() {
        let store = Arc::new(MemorySessionStore::new());
        let cache =
            ScopedCache::with_prefix(Arc::clone(&store) as Arc<dyn SessionStore>, "Other#");

        cache.set("a", "1");
        assert_eq!(store.get("Other#a"), Some("1".to_string()));
    }
}
