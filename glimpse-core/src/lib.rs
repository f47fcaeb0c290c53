//! # Glimpse Core
//!
//! Core types, errors, and traits for the Glimpse caching profile relay.
//!
//! This crate provides the foundational building blocks used by all other Glimpse crates:
//!
//! - **Types**: Normalized profile records, raw upstream payloads, outbound identities, incidents
//! - **Errors**: The relay's failure taxonomy and its status mapping
//! - **Constants**: Default TTLs, intervals, timeouts and upstream endpoints
//! - **Traits**: Seams for the upstream source and the notification sink
//!
//! ## Example
//!
//! ```rust
//! use glimpse_core::{ErrorKind, RelayError};
//!
//! let err = RelayError::UpstreamStatus { code: 429 };
//! assert_eq!(err.kind(), ErrorKind::UpstreamStatus);
//! assert_eq!(err.status_code(), 429);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ErrorKind, RelayError, Result};
pub use traits::*;
pub use types::*;
