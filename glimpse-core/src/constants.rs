//! Relay constants for Glimpse.
//!
//! Defaults for every tunable of the relay. Configuration layers override
//! them; nothing else should hard-code these values.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifetime of a successfully fetched profile in the cache (4 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 240;

/// Longest accepted cache TTL or sweep interval (30 days).
pub const MAX_CACHE_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Interval between two passes of the expiry sweeper.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Profile endpoint queried with `?username=<handle>`.
pub const DEFAULT_UPSTREAM_URL: &str = "https://i.instagram.com/api/v1/users/web_profile_info/";

/// Timeout for one upstream request, connect to last body byte.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// Maximum redirect hops followed on an upstream request.
pub const MAX_UPSTREAM_REDIRECTS: usize = 10;

/// Keep-alive connections retained per upstream host.
pub const UPSTREAM_POOL_IDLE_PER_HOST: usize = 100;

/// Application id header value expected by the upstream web API.
pub const UPSTREAM_APP_ID: &str = "936619743392459";

// ═══════════════════════════════════════════════════════════════════════════════
// INBOUND RATE LIMIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Requests a single client may burst before being limited.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Seconds to replenish one request token (10 requests per 10 minutes).
pub const DEFAULT_RATE_LIMIT_PERIOD_SECONDS: u64 = 60;

// ═══════════════════════════════════════════════════════════════════════════════
// NOTIFICATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Base URL of the Telegram Bot API.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Timeout for one notification delivery attempt.
pub const NOTIFICATION_TIMEOUT_SECONDS: u64 = 10;

/// Incidents waiting for delivery before new ones are dropped.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_runs_more_often_than_entries_expire() {
        assert!(DEFAULT_SWEEP_INTERVAL_SECONDS < DEFAULT_CACHE_TTL_SECONDS);
    }

    #[test]
    fn test_default_ttl_within_bound() {
        assert!(DEFAULT_CACHE_TTL_SECONDS <= MAX_CACHE_TTL_SECONDS);
    }

    #[test]
    fn test_rate_limit_window_is_ten_minutes() {
        assert_eq!(
            DEFAULT_RATE_LIMIT_BURST as u64 * DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
            600
        );
    }
}
