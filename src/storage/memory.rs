//! In-process payload cache — fastest tier, volatile.
//!
//! Always a cache of the persistent tier's copy, never the authority.

use crate::payload::ModulePayload;
use std::collections::HashMap;
use std::sync::RwLock;

/// Memory tier keyed by module id.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, ModulePayload>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<ModulePayload> {
        self.entries
            .read()
            .expect("memory cache lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn put(&self, id: &str, payload: ModulePayload) {
        self.entries
            .write()
            .expect("memory cache lock poisoned")
            .insert(id.to_string(), payload);
    }

    pub fn remove(&self, id: &str) {
        self.entries
            .write()
            .expect("memory cache lock poisoned")
            .remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .expect("memory cache lock poisoned")
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("memory cache lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_get_remove() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());

        let payload = ModulePayload::from_value(json!({ "Genesis": { "1": {} } }));
        cache.put("kjv", payload.clone());
        assert_eq!(cache.get("kjv"), Some(payload));
        assert!(cache.contains("kjv"));

        cache.remove("kjv");
        assert!(cache.get("kjv").is_none());
    }
}
