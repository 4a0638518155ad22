//! Session store capability trait and in-memory implementation

use parking_lot::RwLock;
use std::collections::HashMap;

/// Minimal contract over the session-scoped key/value store backing the
/// cache (in-memory, distributed cache, database row, ...).
///
/// Absence is a normal `None` result, never an error, and mutations are
/// immediately visible to subsequent reads within the same session scope.
/// Key enumeration carries no ordering guarantee.
pub trait SessionStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn remove(&self, name: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-memory [`SessionStore`] for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, across all namespaces.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.entries
            .write()
            .insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.entries.write().remove(name);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("a"), None);

        store.set("a", "1");
        assert_eq!(store.get("a"), Some("1".to_string()));

        store.set("a", "2");
        assert_eq!(store.get("a"), Some("2".to_string()));

        store.remove("a");
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let store = MemorySessionStore::new();
        store.remove("missing");
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_enumeration() {
        let store = MemorySessionStore::new();
        store.set("a", "1");
        store.set("b", "2");

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
