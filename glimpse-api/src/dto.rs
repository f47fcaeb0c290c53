//! DTOs for API responses.

use serde::Serialize;

/// Response for the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: &'static str,
    /// Unix timestamp in seconds
    pub timestamp: f64,
}

/// Response for cache statistics.
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    /// Entries stored, expired ones included
    pub total_entries: usize,
    /// Entries that would be served
    pub valid_entries: usize,
    /// Entries awaiting the next sweep
    pub expired_entries: usize,
    /// TTL applied to new entries, in seconds
    pub ttl_seconds: u64,
}
