//! Explicit memoization primitives.
//!
//! Derived statistics on verses and passages (word counts, character counts,
//! chapter ranges) are O(n) over the text, so they are computed once and
//! remembered. Two tools cover the two scopes involved:
//!
//! - [`Memo<T>`] — a per-instance cell for a single derived field, with an
//!   explicit `invalidate()`. There is no automatic dependency tracking;
//!   callers that mutate verses must invalidate manually.
//! - [`ComputeCache`] — a lock-guarded key/value map for cross-request
//!   memoization in a multi-threaded host. It is constructed and injected by
//!   the caller, never a process-global, so tests can substitute an isolated
//!   instance.

use std::collections::HashMap;
use std::sync::Mutex;

/// A lazily computed, explicitly invalidatable field.
///
/// Interior mutability keeps accessor methods `&self` even though the first
/// access fills the cell. Not `Sync`; entity instances follow the
/// single-writer model.
#[derive(Debug)]
pub struct Memo<T> {
    slot: std::cell::RefCell<Option<T>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            slot: std::cell::RefCell::new(None),
        }
    }
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self {
            slot: std::cell::RefCell::new(None),
        }
    }

    /// Return the cached value, computing and storing it on first access.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T {
        let mut slot = self.slot.borrow_mut();
        if let Some(ref value) = *slot {
            return value.clone();
        }
        let value = compute();
        *slot = Some(value.clone());
        value
    }

    /// Drop the cached value so the next access recomputes it.
    pub fn invalidate(&self) {
        *self.slot.borrow_mut() = None;
    }

    /// Whether a value has been computed and retained.
    pub fn is_computed(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<T: Clone> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            slot: std::cell::RefCell::new(self.slot.borrow().clone()),
        }
    }
}

/// Thread-safe key/value memo service for expensive computations shared
/// across requests (e.g. rendered passage displays keyed by cache key).
///
/// The lock protects the map itself, not any business logic; values are
/// stored as JSON so heterogeneous results can share one service.
#[derive(Debug, Default)]
pub struct ComputeCache {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl ComputeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().expect("memo cache lock").get(key).cloned()
    }

    pub fn set(&self, key: &str, value: serde_json::Value) {
        self.entries
            .lock()
            .expect("memo cache lock")
            .insert(key.to_string(), value);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("memo cache lock").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("memo cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_computes_once() {
        let memo: Memo<usize> = Memo::new();
        let mut calls = 0;
        let first = memo.get_or_compute(|| {
            calls += 1;
            42
        });
        let second = memo.get_or_compute(|| {
            calls += 1;
            99
        });
        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_memo_invalidate_forces_recompute() {
        let memo: Memo<String> = Memo::new();
        assert_eq!(memo.get_or_compute(|| "a".to_string()), "a");
        memo.invalidate();
        assert!(!memo.is_computed());
        assert_eq!(memo.get_or_compute(|| "b".to_string()), "b");
    }

    #[test]
    fn test_compute_cache_get_set_clear() {
        let cache = ComputeCache::new();
        assert!(cache.get("k").is_none());
        cache.set("k", serde_json::json!({"words": 7}));
        assert_eq!(cache.get("k").unwrap()["words"], 7);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_compute_cache_isolated_instances() {
        let a = ComputeCache::new();
        let b = ComputeCache::new();
        a.set("shared", serde_json::json!(1));
        assert!(b.get("shared").is_none());
    }

    #[test]
    fn test_compute_cache_concurrent_access() {
        use std::sync::Arc;
        let cache = Arc::new(ComputeCache::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                cache.set(&format!("key-{}", i), serde_json::json!(i));
                cache.get(&format!("key-{}", i))
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }
        assert_eq!(cache.len(), 8);
    }
}
