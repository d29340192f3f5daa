//! Lazily-expiring memoization of resolved domain records.
//!
//! Staleness is checked on read only; there is no sweep and no capacity
//! bound, so memory grows per distinct key ever requested and only same-key
//! overwrites reclaim space. A production deployment would add bounded
//! eviction on top of these semantics.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::shared::DataType;

/// Freshness window for cached records.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache and lookup key: (domain, resolved scope/aspect, normalized identifier).
/// Deterministic given (data_type, raw identifier, query_details).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    pub domain: DataType,
    pub scope: Option<String>,
    pub identifier: String,
}

impl ResolvedKey {
    pub fn new(domain: DataType, identifier: impl Into<String>) -> Self {
        Self {
            domain,
            scope: None,
            identifier: identifier.into(),
        }
    }

    pub fn scoped(domain: DataType, scope: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            domain,
            scope: Some(scope.into()),
            identifier: identifier.into(),
        }
    }
}

struct CacheEntry {
    value: Value,
    cached_at: Instant,
}

/// Concurrent TTL cache for resolved record snapshots.
///
/// DashMap shards guard concurrent writers; an insert under a contended key is
/// atomic and last-write-wins.
pub struct TtlCache {
    entries: DashMap<ResolvedKey, CacheEntry>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Cache with a custom freshness window (tests use short windows).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value if an entry exists and is still fresh.
    /// A stale entry is left in place until the next store overwrites it.
    pub fn get_fresh(&self, key: &ResolvedKey) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.cached_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Stores a record snapshot with a fresh timestamp, replacing any prior
    /// entry for this exact key.
    pub fn store(&self, key: ResolvedKey, value: Value) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Fresh hit returns the cached value without invoking `compute`.
    /// Otherwise `compute` runs; a `Some` result is stored under `key` and
    /// returned, a `None` result (record absent) is not cached.
    pub fn get_or_compute<F>(&self, key: &ResolvedKey, compute: F) -> Option<Value>
    where
        F: FnOnce() -> Option<Value>,
    {
        if let Some(hit) = self.get_fresh(key) {
            return Some(hit);
        }
        let value = compute()?;
        self.store(key.clone(), value.clone());
        Some(value)
    }

    /// Number of entries currently held, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}
