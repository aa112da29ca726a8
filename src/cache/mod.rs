//! Quire cache primitives.
//!
//! - [`BoundedCache`]: fixed-capacity LRU map with optional TTL
//! - [`Memo`]: values recomputed whenever their dependency key changes
//!
//! ## Configuration
//!
//! Cache behaviour is controlled via `quire.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 100
//! ttl_ms = 60000
//! ```

mod clock;
mod config;
mod keys;
mod memo;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheError, DEFAULT_CAPACITY};
pub use keys::{DependencyKey, ListKey, RecordKey, hash_value};
pub use memo::Memo;
pub use store::{BoundedCache, CacheEntry};
