//! Fetch orchestration and typed access to the current configs.
//!
//! `ConfigStore` owns the in-memory snapshot and decides, on every
//! `fetch_configs` call, whether to trust the local cache or go to the
//! network:
//!
//! - a cache younger than 24 hours is used as-is unless `ignore_cache` is set
//! - otherwise the remote document is requested; when it carries the same
//!   known version as the current snapshot nothing changes, in every other
//!   case (newer, older, or no version at all) it replaces the snapshot and
//!   is written to the cache
//! - when the request fails, any cached document is used instead, whatever
//!   its age; with no cache the error is returned and the snapshot is left
//!   as it was
//!
//! The snapshot and fetch date live together in one immutable `StoreState`
//! that is swapped atomically, so readers never see half of an update. Fetches
//! on the same store run one at a time; the last one to finish wins.

pub mod error;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{HttpNetworkProvider, NetworkProvider};
use crate::cache::{CacheProvider, FileCacheProvider};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::snapshot::{ConfigSnapshot, VERSION_NONE};

pub use error::StoreError;

/// Hours a cached document stays fresh.
const CACHE_TTL_HOURS: i64 = 24;

pub fn cache_ttl() -> Duration {
    Duration::hours(CACHE_TTL_HOURS)
}

/// Snapshot plus the time it was last fetched from the server.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub snapshot: Arc<ConfigSnapshot>,
    pub fetch_date: Option<DateTime<Utc>>,
}

/// Where the configs adopted by a `fetch_configs` call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh cache, no request made.
    Cache,
    /// New remote configs adopted and written to the cache.
    Remote,
    /// Server reported the version already held; nothing changed.
    Unchanged,
    /// Request failed; cached configs adopted instead.
    Fallback,
}

pub struct ConfigStore {
    remote_url: String,
    custom_headers: HashMap<String, String>,
    version_key: String,
    clock: Arc<dyn Clock>,
    cache: Arc<dyn CacheProvider>,
    network: Arc<dyn NetworkProvider>,
    state: ArcSwap<StoreState>,
    fetch_lock: Mutex<()>,
}

impl ConfigStore {
    /// Store backed by the file cache, HTTP and the system clock.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let network = HttpNetworkProvider::with_timeout(config.request_timeout())?;
        let cache = FileCacheProvider::new(config.resolve_cache_path()?);
        debug!(path = %cache.path().display(), "Using cache file");
        Ok(Self::with_providers(
            config,
            Arc::new(SystemClock),
            Arc::new(cache),
            Arc::new(network),
        ))
    }

    pub fn with_providers(
        config: StoreConfig,
        clock: Arc<dyn Clock>,
        cache: Arc<dyn CacheProvider>,
        network: Arc<dyn NetworkProvider>,
    ) -> Self {
        Self {
            remote_url: config.remote_url,
            custom_headers: config.custom_headers,
            version_key: config.version_key,
            clock,
            cache,
            network,
            state: ArcSwap::from_pointee(StoreState::default()),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Fetch configs from the cache or the remote server.
    ///
    /// Errors only when the remote fetch fails with no cache to fall back on,
    /// or when freshly fetched configs could not be written to the cache. In
    /// the second case the new configs are still in use.
    pub async fn fetch_configs(&self, ignore_cache: bool) -> Result<FetchOutcome, StoreError> {
        let _guard = self.fetch_lock.lock().await;

        let cache_configs = self.cache.get().await;
        let cache_fresh = self
            .cache
            .last_modified()
            .await
            .map(|modified| self.clock.now() - modified < cache_ttl())
            .unwrap_or(false);

        let cache_configs = match cache_configs {
            Some(configs) if !ignore_cache && cache_fresh => {
                debug!(keys = configs.values().len(), "Using fresh cached configs");
                self.adopt_cached(configs);
                return Ok(FetchOutcome::Cache);
            }
            other => other,
        };

        let remote = match self.request_remote().await {
            Ok(remote) => remote,
            Err(e) => {
                return match cache_configs {
                    Some(configs) => {
                        warn!(error = %e, "Remote fetch failed, falling back to cached configs");
                        self.adopt_cached(configs);
                        Ok(FetchOutcome::Fallback)
                    }
                    None => {
                        warn!(error = %e, "Remote fetch failed and no cached configs exist");
                        Err(e)
                    }
                };
            }
        };

        self.apply_remote(remote).await
    }

    async fn request_remote(&self) -> Result<ConfigSnapshot, StoreError> {
        debug!(url = %self.remote_url, "Requesting remote configs");
        self.network
            .request_json(&self.remote_url, &self.custom_headers)
            .await?
            .ok_or(StoreError::EmptyResponse)
    }

    /// Adopt `remote` unless it carries the same known version we already hold.
    async fn apply_remote(&self, remote: ConfigSnapshot) -> Result<FetchOutcome, StoreError> {
        let new_version = remote.version(&self.version_key);
        let current_version = self.version();
        if new_version == current_version && new_version != VERSION_NONE {
            debug!(version = new_version, "Remote configs unchanged");
            return Ok(FetchOutcome::Unchanged);
        }

        let snapshot = Arc::new(remote);
        self.state.store(Arc::new(StoreState {
            snapshot: Arc::clone(&snapshot),
            fetch_date: Some(self.clock.now()),
        }));
        info!(
            version = new_version,
            previous = current_version,
            keys = snapshot.values().len(),
            "Adopted remote configs"
        );

        if let Err(e) = self.cache.set(&snapshot).await {
            warn!(error = %e, "Failed to cache remote configs");
            return Err(e.into());
        }
        Ok(FetchOutcome::Remote)
    }

    /// Swap in cached configs, keeping the last remote fetch date.
    fn adopt_cached(&self, configs: ConfigSnapshot) {
        let snapshot = Arc::new(configs);
        self.state.rcu(|state| StoreState {
            snapshot: Arc::clone(&snapshot),
            fetch_date: state.fetch_date,
        });
    }

    /// Delete the cache file and forget the current configs.
    ///
    /// The in-memory reset happens even when the delete fails.
    pub fn clear_cache(&self) -> Result<(), StoreError> {
        let deleted = self.cache.delete_cache_file();
        self.state.store(Arc::new(StoreState::default()));
        deleted?;
        info!("Cleared cached configs");
        Ok(())
    }

    // ===== Accessors =====

    /// Version of the current configs, `-1` when unknown.
    pub fn version(&self) -> i64 {
        self.state.load().snapshot.version(&self.version_key)
    }

    /// Last time configs were adopted from the remote server.
    pub fn fetch_date(&self) -> Option<DateTime<Utc>> {
        self.state.load().fetch_date
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.state.load().snapshot)
    }

    pub fn get_keys(&self) -> BTreeSet<String> {
        self.state.load().snapshot.keys()
    }

    pub fn get_json(&self, key: &str) -> Option<Value> {
        self.state.load().snapshot.get(key).cloned()
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        self.state.load().snapshot.get_boolean(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.state.load().snapshot.get_int(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.state.load().snapshot.get_string(key)
    }

    pub fn get_boolean_array(&self, key: &str) -> Option<Vec<bool>> {
        self.state.load().snapshot.get_boolean_array(key)
    }

    pub fn get_int_array(&self, key: &str) -> Option<Vec<i64>> {
        self.state.load().snapshot.get_int_array(key)
    }

    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.state.load().snapshot.get_string_array(key)
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn version_key(&self) -> &str {
        &self.version_key
    }
}

// ============================================================================
// Tests
// ============================================================================
