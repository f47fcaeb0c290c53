//! Upstream access for Glimpse.
//!
//! Fetches raw profiles with a rotated outbound identity, classifies every
//! outcome into the relay's error taxonomy, and normalizes user objects into
//! [`glimpse_core::ProfileRecord`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod fetcher;
mod identity;
mod normalize;

pub use fetcher::{UpstreamConfig, UpstreamFetcher};
pub use identity::{default_identities, IdentityRotator};
pub use normalize::normalize;
