use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::element::ParsedTemplate;

/// Separator joining `path` and `section` in a cache key. NUL never occurs
/// in a logical template path.
const KEY_SEPARATOR: char = '\0';

pub(crate) fn cache_key(path: &str, section: &str) -> String {
    let mut key = String::with_capacity(path.len() + section.len() + 1);
    key.push_str(path);
    key.push(KEY_SEPARATOR);
    key.push_str(section);
    key
}

/// Shared store of immutable parse results, keyed by `(path, section)`.
///
/// First-writer-wins: once an entry exists it is never replaced or
/// invalidated by this engine. Eviction and refresh are external concerns —
/// drop the cache and build a new one. The interior mutex makes a single
/// cache safe to share across render contexts; at most one stored snapshot
/// survives per key.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<String, Arc<ParsedTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<ParsedTemplate>> {
        self.lock().get(key).cloned()
    }

    /// Inserts `parsed` under `key` unless an entry already exists, and
    /// returns the snapshot that ends up cached.
    pub(crate) fn insert(&self, key: String, parsed: Arc<ParsedTemplate>) -> Arc<ParsedTemplate> {
        Arc::clone(self.lock().entry(key).or_insert(parsed))
    }

    /// Number of cached `(path, section)` entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ParsedTemplate>>> {
        // A poisoned map is still structurally valid: entries are only ever
        // inserted whole, never mutated in place.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
