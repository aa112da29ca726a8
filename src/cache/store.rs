//! Bounded least-recently-used storage.
//!
//! Recency is the order of the underlying LRU list, which every hit and every
//! write refreshes. Instants recorded on each entry drive TTL expiry only.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::trace;

use super::clock::{Clock, SystemClock};
use super::config::{CacheConfig, CacheError};

const METRIC_CACHE_HIT: &str = "quire_cache_hit_total";
const METRIC_CACHE_MISS: &str = "quire_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "quire_cache_evict_total";
const METRIC_CACHE_EXPIRED: &str = "quire_cache_expired_total";

/// A stored value together with its bookkeeping timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub last_accessed_at: Instant,
}

/// Fixed-capacity map evicting the least recently accessed entry.
///
/// Writes go through `&mut self`; callers that share an instance across tasks
/// must serialize access themselves.
pub struct BoundedCache<K, V, C = SystemClock> {
    name: &'static str,
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Option<Duration>,
    clock: C,
}

impl<K: Hash + Eq, V> BoundedCache<K, V, SystemClock> {
    /// Create an unnamed cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::from_config("default", &CacheConfig::with_capacity(capacity))
    }

    pub fn from_config(name: &'static str, config: &CacheConfig) -> Result<Self, CacheError> {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<K: Hash + Eq, V, C: Clock> BoundedCache<K, V, C> {
    pub fn with_clock(
        name: &'static str,
        config: &CacheConfig,
        clock: C,
    ) -> Result<Self, CacheError> {
        let capacity = config.capacity_non_zero()?;
        let ttl = config.ttl()?;
        Ok(Self {
            name,
            entries: LruCache::new(capacity),
            ttl,
            clock,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, refreshing its recency on a hit.
    ///
    /// Entries older than the TTL are dropped here and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let name = self.name;
        let now = self.clock.now();

        if self.expire_if_stale(key, now) {
            counter!(METRIC_CACHE_MISS, "cache" => name).increment(1);
            return None;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed_at = now;
                counter!(METRIC_CACHE_HIT, "cache" => name).increment(1);
                Some(&entry.value)
            }
            None => {
                counter!(METRIC_CACHE_MISS, "cache" => name).increment(1);
                None
            }
        }
    }

    /// Insert or replace `key`. The entry becomes the most recently used.
    ///
    /// Replacing a live entry keeps its insertion time. Inserting a new key
    /// into a full cache evicts exactly one entry, the least recently used.
    pub fn set(&mut self, key: K, value: V) {
        let name = self.name;
        let now = self.clock.now();

        self.expire_if_stale(&key, now);

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.last_accessed_at = now;
            return;
        }

        let entry = CacheEntry {
            value,
            inserted_at: now,
            last_accessed_at: now,
        };

        if self.entries.push(key, entry).is_some() {
            counter!(METRIC_CACHE_EVICT, "cache" => name).increment(1);
            trace!(cache = name, "evicted least recently used entry");
        }
    }

    /// Whether a live entry exists for `key`. Does not touch recency.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        if self.expire_if_stale(key, now) {
            return false;
        }
        self.entries.contains(key)
    }

    /// Read without refreshing recency. Stale entries read as absent but are
    /// left in place.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek_entry(key).map(|entry| &entry.value)
    }

    pub fn peek_entry<Q>(&self, key: &Q) -> Option<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.entries
            .peek(key)
            .filter(|entry| !self.is_stale(entry, now))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.pop(key).map(|entry| entry.value)
    }

    /// Drop every entry matching `predicate`.
    pub fn retain<F>(&mut self, mut predicate: F)
    where
        K: Clone,
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, entry)| !predicate(key, &entry.value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            self.entries.pop(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys from most to least recently used, including stale ones not yet
    /// collected.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    fn is_stale(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.inserted_at) >= ttl)
    }

    fn expire_if_stale<Q>(&mut self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let stale = self
            .entries
            .peek(key)
            .is_some_and(|entry| self.is_stale(entry, now));
        if stale {
            self.entries.pop(key);
            counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(1);
        }
        stale
    }
}
