//! TTL-bounded cache store for one resource family.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::warn;
use serde::Serialize;

use super::{Provenance, ResourceFamily};

/// A single cached payload.
///
/// Entries are immutable once stored: a write-through from a live fetch or
/// an explicit invalidation replaces them wholesale, never field by field.
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// When this entry was captured from upstream (or synthesized)
    pub captured_at: Instant,
    /// How the entry was produced
    pub provenance: Provenance,
}

/// Diagnostic counters for one family cache.
#[derive(Clone, Debug, Serialize)]
pub struct FamilyStats {
    /// Which family this cache holds
    pub family: ResourceFamily,
    /// Number of entries currently stored
    pub entry_count: usize,
    /// Approximate payload size (JSON-encoded bytes)
    pub approx_bytes: usize,
    /// The cache keys currently present, sorted
    pub keys: Vec<String>,
}

/// Keyed cache for a single resource family.
///
/// Entries live until explicitly invalidated or the process restarts; the
/// TTL only gates whether a read counts as fresh. Stale entries are kept on
/// purpose - they are the degradation path when the upstream is down.
pub struct FamilyCache<T> {
    family: ResourceFamily,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone + Serialize> FamilyCache<T> {
    /// Create an empty cache for `family` with the given freshness TTL.
    pub fn new(family: ResourceFamily, ttl: Duration) -> Self {
        Self {
            family,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Lock for reading, recovering from poison if necessary.
    ///
    /// Serving a possibly half-refreshed cache map is still sound here:
    /// entries are replaced atomically under the write lock, so recovery
    /// only risks observing an older entry.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("{} cache lock was poisoned, recovering", self.family);
            poisoned.into_inner()
        })
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("{} cache lock was poisoned, recovering", self.family);
            poisoned.into_inner()
        })
    }

    /// The family this cache holds.
    pub fn family(&self) -> ResourceFamily {
        self.family
    }

    /// Look up an entry by key, fresh or stale.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.read_entries().get(key).cloned()
    }

    /// Whether an entry is still within this cache's TTL.
    pub fn is_fresh(&self, entry: &CacheEntry<T>) -> bool {
        entry.captured_at.elapsed() < self.ttl
    }

    /// Store a payload under `key`, replacing any existing entry.
    pub fn put(&self, key: &str, data: T, provenance: Provenance) {
        let entry = CacheEntry {
            data,
            captured_at: Instant::now(),
            provenance,
        };
        self.write_entries().insert(key.to_string(), entry);
    }

    /// Remove a single entry.
    pub fn invalidate(&self, key: &str) {
        self.write_entries().remove(key);
    }

    /// Remove every entry in this family.
    pub fn invalidate_all(&self) {
        self.write_entries().clear();
    }

    /// Diagnostic counters for this cache.
    pub fn stats(&self) -> FamilyStats {
        let entries = self.read_entries();

        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        let approx_bytes = entries
            .values()
            .map(|entry| {
                serde_json::to_string(&entry.data)
                    .map(|json| json.len())
                    .unwrap_or(0)
            })
            .sum();

        FamilyStats {
            family: self.family,
            entry_count: entries.len(),
            approx_bytes,
            keys,
        }
    }
}
