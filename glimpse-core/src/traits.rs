//! Common traits for Glimpse.
//!
//! These traits define the seams between the orchestrator and its
//! collaborators, so each side can be replaced in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Incident, UserPayload};

// ═══════════════════════════════════════════════════════════════════════════════
// PROFILE SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for fetching a raw profile from the upstream.
///
/// Implementations must return one of the four fetch failures
/// (`Transport`, `UpstreamStatus`, `MalformedResponse`, `RecordNotFound`)
/// on failure. Any other error reaching the orchestrator is treated as
/// unclassified.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetches the user object for an already-normalized handle.
    ///
    /// Performs exactly one attempt; retries are the caller's business.
    async fn fetch(&self, handle: &str) -> Result<UserPayload>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFICATION SINK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for delivering incident messages to an operator.
///
/// Delivery is best-effort: callers log a returned error and move on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one incident.
    async fn deliver(&self, incident: &Incident) -> Result<()>;
}
