//! In-memory cache store for revalidated values
//!
//! Holds the most recent successfully fetched value per key together with the
//! time that fetch started. Both live in one entry so they are always written
//! as a unit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

/// A cached value and the start time of the fetch that produced it
#[derive(Debug)]
struct CacheEntry<T> {
    /// Last successfully fetched value, shared read-only with every binding
    value: Arc<T>,
    /// When the fetch that produced `value` started
    fetched_at: Instant,
}

/// Key-value store of fetched payloads plus their fetch timestamps
///
/// Entries are never evicted and only ever replaced by a successful fetch.
/// A store is created explicitly and shared by `Arc` between every binding
/// that should see the same data; separate instances are fully isolated.
#[derive(Debug)]
pub struct CacheStore<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheStore<T> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A panic while holding the lock cannot leave an entry half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.lock().get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Returns whether a successful fetch has ever been recorded for `key`
    pub fn has_entry(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Returns the start time of the last successful fetch for `key`
    pub fn last_fetched(&self, key: &str) -> Option<Instant> {
        self.lock().get(key).map(|entry| entry.fetched_at)
    }

    /// Records a successful fetch, replacing value and timestamp together
    pub(crate) fn record(&self, key: &str, value: Arc<T>, fetched_at: Instant) {
        self.lock()
            .insert(key.to_string(), CacheEntry { value, fetched_at });
    }

    /// Number of keys with a recorded value
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been fetched yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
