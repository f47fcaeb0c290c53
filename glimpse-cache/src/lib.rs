//! TTL cache for Glimpse profiles.
//!
//! Generic in-memory cache with per-entry expiry, an injectable clock, and
//! a background sweeper that purges stale entries from any [`Sweep`] store.

mod cache;
mod clock;
mod sweeper;

pub use cache::{normalize_key, CacheConfig, CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use sweeper::{Sweep, Sweeper};
