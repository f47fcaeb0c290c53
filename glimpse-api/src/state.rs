//! App state: relay, inbound rate limiter, config.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use governor::Quota;
use tracing::{info, warn};

use glimpse_core::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
    DEFAULT_SWEEP_INTERVAL_SECONDS, DEFAULT_UPSTREAM_TIMEOUT_SECONDS, DEFAULT_UPSTREAM_URL,
    MAX_CACHE_TTL_SECONDS,
};
use glimpse_core::error::{RelayError, Result};
use glimpse_relay::{Notifier, ProfileRelay, RelayOptions, TelegramConfig, TelegramSink};
use glimpse_upstream::UpstreamConfig;

use crate::limiter::ClientLimiter;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Upstream profile endpoint
    pub upstream_url: String,
    /// Upstream request timeout
    pub upstream_timeout_seconds: u64,
    /// Lifetime of a cached profile
    pub cache_ttl_seconds: u64,
    /// Interval between expiry sweeps
    pub sweep_interval_seconds: u64,
    /// Requests a client may burst
    pub rate_limit_burst: u32,
    /// Seconds to replenish one request
    pub rate_limit_period_seconds: u64,
    /// Telegram alerts; incidents are only logged when unset
    pub telegram: Option<TelegramConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            upstream_timeout_seconds: DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            rate_limit_period_seconds: DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
            telegram: None,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let telegram = match (
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("TELEGRAM_CHAT_ID").ok(),
        ) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some(TelegramConfig::new(token, chat))
            }
            _ => None,
        };

        Self {
            upstream_url: std::env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            upstream_timeout_seconds: env_or(
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults.upstream_timeout_seconds,
            ),
            cache_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            sweep_interval_seconds: env_or("SWEEP_INTERVAL_SECONDS", defaults.sweep_interval_seconds),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            rate_limit_period_seconds: env_or(
                "RATE_LIMIT_PERIOD_SECONDS",
                defaults.rate_limit_period_seconds,
            ),
            telegram,
        }
    }

    /// Sweep cadence shared by the cache and the rate limiter.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }

    fn validate(&self) -> Result<()> {
        if self.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
            return Err(RelayError::Config(format!(
                "CACHE_TTL_SECONDS must be at most {}",
                MAX_CACHE_TTL_SECONDS
            )));
        }
        if self.sweep_interval_seconds > MAX_CACHE_TTL_SECONDS {
            return Err(RelayError::Config(format!(
                "SWEEP_INTERVAL_SECONDS must be at most {}",
                MAX_CACHE_TTL_SECONDS
            )));
        }
        Ok(())
    }

    fn rate_limit_quota(&self) -> Result<Quota> {
        let burst = NonZeroU32::new(self.rate_limit_burst)
            .ok_or_else(|| RelayError::Config("RATE_LIMIT_BURST must be positive".into()))?;
        let quota = Quota::with_period(Duration::from_secs(self.rate_limit_period_seconds))
            .ok_or_else(|| RelayError::Config("RATE_LIMIT_PERIOD_SECONDS must be positive".into()))?;
        Ok(quota.allow_burst(burst))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Shared application state.
pub struct AppState {
    /// Effective configuration
    pub config: ApiConfig,
    /// Profile relay
    pub relay: ProfileRelay,
    /// Per-client-IP inbound limiter
    pub limiter: Arc<ClientLimiter>,
}

impl AppState {
    /// Builds the relay, notifier and limiter from `config`.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let notifier = match &config.telegram {
            Some(telegram) => {
                info!(chat_id = %telegram.chat_id, "Telegram notifications enabled");
                Notifier::new(Arc::new(TelegramSink::with_config(telegram.clone())?))
            }
            None => {
                info!("Telegram not configured, incidents are only logged");
                Notifier::log_only()
            }
        };

        let upstream = UpstreamConfig::new(&config.upstream_url)
            .with_timeout(Duration::from_secs(config.upstream_timeout_seconds));
        let options = RelayOptions {
            cache_ttl_seconds: config.cache_ttl_seconds,
            sweep_interval_seconds: config.sweep_interval_seconds,
        };
        let relay = ProfileRelay::from_config(upstream, options, notifier)?;
        let limiter = Arc::new(ClientLimiter::new(config.rate_limit_quota()?));

        Ok(Self {
            config,
            relay,
            limiter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_builds() {
        let state = AppState::new(ApiConfig::default()).unwrap();
        assert_eq!(state.config.cache_ttl_seconds, 240);
        assert!(state.relay.cache().is_empty());
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = ApiConfig {
            rate_limit_burst: 0,
            ..Default::default()
        };
        assert!(matches!(AppState::new(config), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_limiter_enforces_burst() {
        let config = ApiConfig {
            rate_limit_burst: 2,
            ..Default::default()
        };
        let state = AppState::new(config).unwrap();
        let ip = "203.0.113.7".parse().unwrap();
        let other = "203.0.113.8".parse().unwrap();

        assert!(state.limiter.check(ip));
        assert!(state.limiter.check(ip));
        assert!(!state.limiter.check(ip));
        assert!(state.limiter.check(other));
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let config = ApiConfig {
            cache_ttl_seconds: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(AppState::new(config), Err(RelayError::Config(_))));

        let config = ApiConfig {
            cache_ttl_seconds: MAX_CACHE_TTL_SECONDS,
            ..Default::default()
        };
        assert!(AppState::new(config).is_ok());
    }

    #[test]
    fn test_out_of_range_sweep_interval_rejected() {
        let config = ApiConfig {
            sweep_interval_seconds: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(AppState::new(config), Err(RelayError::Config(_))));
    }
}
