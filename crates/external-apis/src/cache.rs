// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Response caching for the failover client
//!
//! [`ResponseCache`] is the get/set/clear surface the client depends on.
//! [`TtlCache`] is the default implementation: a sharded concurrent map with a
//! fixed TTL, lazy eviction of expired entries on lookup and an optional entry bound.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use api_client::ResponsePayload;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Key/value store for parsed responses
pub trait ResponseCache: Send + Sync {
    /// Live entry for `key`, if any
    fn get(&self, key: &str) -> Option<ResponsePayload>;

    /// Store or overwrite the entry for `key`
    fn set(&self, key: &str, value: ResponsePayload);

    /// Drop every entry
    fn clear(&self);

    /// Number of stored entries, expired ones included until evicted
    fn len(&self) -> usize;

    /// Whether the cache holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters describing cache effectiveness
    fn stats(&self) -> CacheStats;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResponsePayload,
    stored_at: Instant,
    last_access: Instant,
    access_count: u64,
}

impl CacheEntry {
    fn new(value: ResponsePayload) -> Self {
        let now = Instant::now();
        Self {
            value,
            stored_at: now,
            last_access: now,
            access_count: 0,
        }
    }

    fn is_live(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.stores,
            &self.evictions,
            &self.expired,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// In-memory TTL cache with lazy eviction
#[derive(Debug)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
    counters: Counters,
}

impl TtlCache {
    /// Create an unbounded cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: None,
            counters: Counters::default(),
        }
    }

    /// Create a cache holding at most `max_entries` entries
    ///
    /// At 90% of the bound expired entries are swept before each insert; at the
    /// bound the least recently accessed entry is evicted.
    pub fn bounded(ttl: Duration, max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new(ttl)
        }
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove every expired entry, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.counters
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(
                removed_entries = removed,
                remaining_entries = self.entries.len(),
                "cleaned up expired cache entries"
            );
        }
        removed
    }

    /// Reset counters and drop every entry
    pub fn clear_all(&self) {
        self.clear();
        self.counters.reset();
    }

    fn make_room(&self, max_entries: usize) {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let sweep_threshold = (max_entries as f64 * 0.9) as usize;

        if self.entries.len() >= sweep_threshold {
            self.cleanup_expired();
        }
        if self.entries.len() >= max_entries {
            self.evict_least_recently_used();
        }
    }

    fn evict_least_recently_used(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|item| (item.value().last_access, item.value().access_count))
            .map(|item| item.key().clone());

        if let Some(key) = victim
            && let Some((key, entry)) = self.entries.remove(&key)
        {
            Counters::bump(&self.counters.evictions);
            info!(
                key = %key,
                access_count = entry.access_count,
                age_ms = entry.stored_at.elapsed().as_millis(),
                remaining_entries = self.entries.len(),
                "evicted lru cache entry due to capacity limit"
            );
        }
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &str) -> Option<ResponsePayload> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_live(self.ttl) {
                entry.last_access = Instant::now();
                entry.access_count += 1;
                Counters::bump(&self.counters.hits);
                trace!(key, "cache hit");
                return Some(entry.value.clone());
            }
            drop(entry);
            // A concurrent set may have refreshed the entry since the check above.
            if self
                .entries
                .remove_if(key, |_, entry| !entry.is_live(self.ttl))
                .is_some()
            {
                Counters::bump(&self.counters.expired);
                debug!(key, "expired cache entry removed");
            }
        }

        Counters::bump(&self.counters.misses);
        None
    }

    fn set(&self, key: &str, value: ResponsePayload) {
        if let Some(max_entries) = self.max_entries
            && !self.entries.contains_key(key)
        {
            self.make_room(max_entries);
        }

        self.entries.insert(key.to_string(), CacheEntry::new(value));
        Counters::bump(&self.counters.stores);
        trace!(key, entries = self.entries.len(), "stored response in cache");
    }

    fn clear(&self) {
        self.entries.clear();
        debug!("cleared all cached responses");
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.entries.len(),
            hits,
            misses,
            stores: self.counters.stores.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            hit_rate,
            max_entries: self.max_entries,
            ttl_ms: u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Cache statistics and metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub entry_count: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries written
    pub stores: u64,
    /// Entries evicted to respect the bound
    pub evictions: u64,
    /// Entries removed after their TTL passed
    pub expired: u64,
    /// Hits over lookups (0.0 to 1.0)
    pub hit_rate: f64,
    /// Entry bound, if any
    pub max_entries: Option<usize>,
    /// TTL in milliseconds
    pub ttl_ms: u64,
}
