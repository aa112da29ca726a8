//! Cache key definitions.
//!
//! Each cache owned by the content service is keyed by one of these types so
//! that invalidating a content kind can find every dependent entry.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::content::ContentKind;

/// Identifies a cached listing: every record of a kind under one filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub kind: ContentKind,
    pub include_drafts: bool,
}

/// Identifies a single cached record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub kind: ContentKind,
    pub slug: String,
}

impl RecordKey {
    pub fn new(kind: ContentKind, slug: impl Into<String>) -> Self {
        Self {
            kind,
            slug: slug.into(),
        }
    }
}

/// Fingerprint of whatever a memoized value was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyKey(u64);

impl DependencyKey {
    pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
        Self(hash_value(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Hash any hashable value with the standard library hasher.
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
