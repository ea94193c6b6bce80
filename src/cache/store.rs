//! Generic TTL cache store
//!
//! Provides a `TtlCache` that holds cloneable values under string keys with
//! expiry timestamps. Readers cannot distinguish "never set" from "expired";
//! both report absent.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// A stored value together with its expiry instant
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// In-memory key/value store with per-entry TTL
///
/// `get` and `set` are plain synchronous operations; the map synchronizes
/// internally so request handlers and the refresh sweep can touch it
/// concurrently. Key count is bounded by the callers' key scheme (one key
/// per subscriber), not by request volume.
#[derive(Debug, Default)]
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
}

impl<T: Clone> TtlCache<T> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the value stored under `key` if it has not expired
    ///
    /// Expired entries are evicted on the way out and reported as absent,
    /// exactly like keys that were never written.
    pub fn get(&self, key: &str) -> Option<T> {
        {
            let entry = self.entries.get(key)?;
            if Utc::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        // The guard above is dropped before eviction touches the map again.
        self.entries.remove(key);
        None
    }

    /// Stores `value` under `key`, overwriting any previous entry
    ///
    /// The expiry window always restarts from now.
    pub fn set(&self, key: &str, value: T, ttl_secs: u64) {
        let entry = CacheEntry {
            value,
            expires_at: Utc::now() + Duration::seconds(ttl_secs as i64),
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Removes the entry under `key`, if any
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }
}
