//! Dependency-keyed memoization on top of [`BoundedCache`].
//!
//! Each slot remembers the fingerprint of the inputs its value was computed
//! from. A lookup with a different dependency recomputes and replaces the slot
//! instead of serving the stale value.

use std::borrow::Borrow;
use std::convert::Infallible;
use std::hash::Hash;

use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::config::{CacheConfig, CacheError};
use super::keys::DependencyKey;
use super::store::BoundedCache;

struct MemoSlot<V> {
    dependency: DependencyKey,
    value: V,
}

pub struct Memo<K, V, C = SystemClock> {
    slots: BoundedCache<K, MemoSlot<V>, C>,
}

impl<K: Hash + Eq, V: Clone> Memo<K, V, SystemClock> {
    pub fn new(name: &'static str, config: &CacheConfig) -> Result<Self, CacheError> {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<K: Hash + Eq, V: Clone, C: Clock> Memo<K, V, C> {
    pub fn with_clock(
        name: &'static str,
        config: &CacheConfig,
        clock: C,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            slots: BoundedCache::with_clock(name, config, clock)?,
        })
    }

    /// Return the value memoized under `key` for `dependency`, computing it
    /// when the slot is missing, expired or was built from another dependency.
    pub fn get_or_compute<D, F>(&mut self, key: K, dependency: &D, compute: F) -> V
    where
        D: Hash + ?Sized,
        F: FnOnce() -> V,
    {
        match self.try_get_or_compute(key, dependency, || Ok::<V, Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`Memo::get_or_compute`]. Errors are not cached.
    pub fn try_get_or_compute<D, F, E>(
        &mut self,
        key: K,
        dependency: &D,
        compute: F,
    ) -> Result<V, E>
    where
        D: Hash + ?Sized,
        F: FnOnce() -> Result<V, E>,
    {
        let dependency = DependencyKey::of(dependency);

        if let Some(slot) = self.slots.get(&key) {
            if slot.dependency == dependency {
                return Ok(slot.value.clone());
            }
            debug!(
                cache = self.slots.name(),
                "memo dependency changed; recomputing"
            );
        }

        let value = compute()?;
        self.slots.set(
            key,
            MemoSlot {
                dependency,
                value: value.clone(),
            },
        );
        Ok(value)
    }

    pub fn invalidate<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.remove(key);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
