//! Profile lookup façade: cache, upstream, normalization.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use glimpse_cache::{normalize_key, CacheConfig, Sweeper, TtlCache};
use glimpse_core::constants::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_SWEEP_INTERVAL_SECONDS};
use glimpse_core::error::{RelayError, Result};
use glimpse_core::traits::ProfileSource;
use glimpse_core::types::{Incident, ProfileRecord};
use glimpse_upstream::{normalize, UpstreamConfig, UpstreamFetcher};

use crate::notify::Notifier;

/// Relay options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayOptions {
    /// Lifetime of a cached profile, in seconds
    pub cache_ttl_seconds: u64,
    /// Interval between expiry sweeps, in seconds
    pub sweep_interval_seconds: u64,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }
}

impl RelayOptions {
    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Sweep interval as a duration, never zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

/// Result of a lookup with metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    /// The normalized profile
    pub record: ProfileRecord,
    /// The normalized handle the lookup was keyed on
    pub handle: String,
    /// Whether the result came from cache
    pub from_cache: bool,
}

/// Caching relay in front of a profile source.
///
/// Resolves handles by:
/// 1. Serving an unexpired cache entry, if any
/// 2. Otherwise fetching the user object from the source
/// 3. Normalizing it into a [`ProfileRecord`]
/// 4. Caching the record for the configured TTL
///
/// Failures are never cached. Each failure is reported to the notifier
/// without delaying the caller. Concurrent misses on the same handle are
/// not coalesced: each one reaches the source and the last write wins.
pub struct ProfileRelay {
    source: Arc<dyn ProfileSource>,
    cache: Arc<TtlCache<ProfileRecord>>,
    notifier: Notifier,
    options: RelayOptions,
}

impl ProfileRelay {
    /// Creates a relay over an existing source and cache.
    pub fn new(
        source: Arc<dyn ProfileSource>,
        cache: Arc<TtlCache<ProfileRecord>>,
        notifier: Notifier,
    ) -> Self {
        Self::with_options(source, cache, notifier, RelayOptions::default())
    }

    /// Creates a relay with custom options.
    pub fn with_options(
        source: Arc<dyn ProfileSource>,
        cache: Arc<TtlCache<ProfileRecord>>,
        notifier: Notifier,
        options: RelayOptions,
    ) -> Self {
        Self {
            source,
            cache,
            notifier,
            options,
        }
    }

    /// Creates a relay backed by the HTTP upstream and a fresh cache.
    pub fn from_config(
        upstream: UpstreamConfig,
        options: RelayOptions,
        notifier: Notifier,
    ) -> Result<Self> {
        let fetcher = UpstreamFetcher::with_config(upstream)?;
        let cache = TtlCache::with_config(CacheConfig::default().with_ttl(options.cache_ttl()));
        Ok(Self::with_options(
            Arc::new(fetcher),
            Arc::new(cache),
            notifier,
            options,
        ))
    }

    /// Resolves a handle to its profile.
    pub async fn lookup(&self, handle: &str) -> Result<ProfileRecord> {
        self.lookup_detailed(handle).await.map(|l| l.record)
    }

    /// Resolves a handle, reporting whether the cache answered.
    #[instrument(skip(self))]
    pub async fn lookup_detailed(&self, handle: &str) -> Result<Lookup> {
        let handle = normalize_key(handle);
        if handle.is_empty() {
            return Err(RelayError::InvalidHandle("handle cannot be empty".into()));
        }

        if let Some(record) = self.cache.get(&handle) {
            debug!(%handle, "Cache hit");
            return Ok(Lookup {
                record,
                handle,
                from_cache: true,
            });
        }

        debug!(%handle, "Cache miss, fetching upstream");

        let payload = match self.source.fetch(&handle).await {
            Ok(payload) => payload,
            Err(err) => return Err(self.fail(&handle, err)),
        };

        let record = normalize(&payload);
        self.cache.put(&handle, record.clone(), self.options.cache_ttl());

        info!(%handle, "Fetched profile");

        Ok(Lookup {
            record,
            handle,
            from_cache: false,
        })
    }

    /// Starts the expiry sweeper over this relay's cache.
    pub fn start_sweeper(&self) -> Sweeper {
        Sweeper::start(self.cache.clone(), self.options.sweep_interval())
    }

    /// The shared profile cache.
    pub fn cache(&self) -> &Arc<TtlCache<ProfileRecord>> {
        &self.cache
    }

    /// The incident notifier.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Classifies a failed fetch and reports it.
    fn fail(&self, handle: &str, err: RelayError) -> RelayError {
        let err = match err {
            err if err.is_fetch_failure() => err,
            RelayError::Unclassified(detail) => {
                error!(%handle, error = %detail, "Unclassified failure during lookup");
                RelayError::Unclassified(detail)
            }
            other => {
                error!(%handle, error = %other, kind = ?other.kind(), "Unclassified failure during lookup");
                RelayError::Unclassified(other.to_string())
            }
        };

        if let Some(incident) = Incident::from_lookup_error(handle, &err) {
            self.notifier.emit(incident);
        }
        err
    }
}
