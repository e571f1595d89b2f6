use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to fetch remote configs: {0}")]
    Network(#[from] ApiError),

    #[error("Remote server returned no configs")]
    EmptyResponse,

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// True for failures that fall back to the cache.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, StoreError::Network(_) | StoreError::EmptyResponse)
    }
}
