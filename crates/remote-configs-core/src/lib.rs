//! Core library for basic-remote-configs.
//!
//! Fetches a small JSON configuration document from a remote server, keeps a
//! copy on disk, and serves typed reads from whichever copy is current.
//!
//! In-memory fakes for every collaborator live in `testing`, behind the
//! `test-support` feature.
//!
//! ```no_run
//! # async fn run() -> Result<(), remote_configs_core::StoreError> {
//! use remote_configs_core::{ConfigStore, StoreConfig};
//!
//! let config = StoreConfig::new("https://example.com/configs.json")
//!     .with_header("X-Api-Key", "secret");
//! let store = ConfigStore::new(config)?;
//! store.fetch_configs(false).await?;
//!
//! let enabled = store.get_boolean("newOnboarding").unwrap_or(false);
//! # let _ = enabled;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod snapshot;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::{ApiError, HttpNetworkProvider, NetworkProvider};
pub use cache::{CacheError, CacheProvider, FileCacheProvider};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StoreConfig;
pub use snapshot::{ConfigSnapshot, DEFAULT_VERSION_KEY, VERSION_NONE};
pub use store::{cache_ttl, ConfigStore, FetchOutcome, StoreError, StoreState};
