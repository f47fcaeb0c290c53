//! Domain types for Glimpse.
//!
//! - [`ProfileRecord`]: Normalized profile served to clients and stored in the cache
//! - [`UserPayload`]: Raw upstream user object, validated by the fetcher
//! - [`IdentityProfile`]: One outbound header set presented to the upstream
//! - [`Incident`]: A failure worth reporting to the notification sink

mod identity;
mod incident;
mod profile;

pub use identity::*;
pub use incident::*;
pub use profile::*;
