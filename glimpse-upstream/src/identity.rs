//! Outbound identity pool and random selection.

use std::sync::Arc;

use rand::seq::SliceRandom;

use glimpse_core::constants::UPSTREAM_APP_ID;
use glimpse_core::error::{RelayError, Result};
use glimpse_core::types::IdentityProfile;

const ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// Fixed pool of identities with uniform random selection.
///
/// Stateless across calls: consecutive selections are independent and may
/// repeat.
#[derive(Clone, Debug)]
pub struct IdentityRotator {
    pool: Arc<[IdentityProfile]>,
}

impl IdentityRotator {
    /// Creates a rotator over `pool`. The pool must not be empty.
    pub fn new(pool: Vec<IdentityProfile>) -> Result<Self> {
        if pool.is_empty() {
            return Err(RelayError::Config("identity pool cannot be empty".into()));
        }
        Ok(Self { pool: pool.into() })
    }

    /// Picks one identity uniformly at random.
    pub fn select(&self) -> &IdentityProfile {
        // `new` guarantees a non-empty pool.
        self.pool
            .choose(&mut rand::thread_rng())
            .unwrap_or(&self.pool[0])
    }

    /// Number of identities in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns true if the pool has no identities.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self {
            pool: default_identities().into(),
        }
    }
}

fn browser(label: &str, user_agent: &str, accept_language: &str) -> IdentityProfile {
    IdentityProfile::new(
        label,
        [
            ("x-ig-app-id", UPSTREAM_APP_ID),
            ("User-Agent", user_agent),
            ("Accept-Language", accept_language),
            ("Accept-Encoding", ACCEPT_ENCODING),
            ("Accept", "*/*"),
        ],
    )
}

/// The built-in pool: desktop and mobile browsers plus the Android app.
pub fn default_identities() -> Vec<IdentityProfile> {
    vec![
        browser(
            "chrome-windows",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
            "en-US,en;q=0.9",
        ),
        browser(
            "safari-macos",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            "en-GB,en;q=0.8",
        ),
        browser(
            "chrome-linux",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/121.0.6167.86 Safari/537.36",
            "en-US,en;q=0.7",
        ),
        browser(
            "safari-ios",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_3 like Mac OS X) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.3 Mobile/15E148 Safari/604.1",
            "en-US,en;q=0.9",
        ),
        browser(
            "chrome-android",
            "Mozilla/5.0 (Linux; Android 14; Pixel 7 Pro) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/122.0.6261.105 Mobile Safari/537.36",
            "en-US,en;q=0.9",
        ),
        browser(
            "instagram-android",
            "Mozilla/5.0 (Linux; Android 14; Pixel 6) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/123.0.0.0 Mobile Safari/537.36 \
             Instagram 320.0.0.23.111 Android",
            "en-US,en;q=0.9",
        ),
    ]
}
