//! Per-client inbound rate limiting.

use std::net::IpAddr;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use glimpse_cache::Sweep;

/// Keyed GCRA limiter over client IP addresses.
///
/// Every address seen gets a state entry. [`ClientLimiter::prune`] drops
/// the entries of clients that are back to a full burst, so a sweeper keeps
/// the map proportional to recently active clients.
pub struct ClientLimiter {
    inner: DefaultKeyedRateLimiter<IpAddr>,
}

impl ClientLimiter {
    /// Creates a limiter enforcing `quota` per address.
    pub fn new(quota: Quota) -> Self {
        Self {
            inner: RateLimiter::keyed(quota),
        }
    }

    /// Consumes one request token for `ip`. Returns false when limited.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.inner.check_key(&ip).is_ok()
    }

    /// Drops idle client entries and returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain_recent();
        self.inner.shrink_to_fit();
        before.saturating_sub(self.inner.len())
    }

    /// Number of tracked client addresses.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no client is tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Sweep for ClientLimiter {
    fn sweep(&self) -> usize {
        self.prune()
    }

    fn remaining(&self) -> usize {
        self.len()
    }

    fn name(&self) -> &'static str {
        "rate-limiter"
    }
}
