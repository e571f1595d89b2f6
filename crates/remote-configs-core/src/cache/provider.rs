use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::CacheError;
use crate::snapshot::ConfigSnapshot;

/// Durable storage for exactly one configuration document.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Read the cached document. Read and parse failures yield `None`.
    async fn get(&self) -> Option<ConfigSnapshot>;

    /// Replace the cached document. Readers never observe a partial write.
    async fn set(&self, configs: &ConfigSnapshot) -> Result<(), CacheError>;

    /// When the cached document was last written, `None` if there is none.
    async fn last_modified(&self) -> Option<DateTime<Utc>>;

    /// Remove the cached document. Removing a missing document succeeds.
    ///
    /// Runs inline on the caller's thread, as `ConfigStore::clear_cache` is
    /// synchronous.
    fn delete_cache_file(&self) -> Result<(), CacheError>;
}
