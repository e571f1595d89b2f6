//! Store configuration.
//!
//! A `StoreConfig` names the remote document, the headers sent with each
//! fetch, the JSON key carrying the version and where the cache lives. It can
//! be built in code, read from a JSON file, or read from `BRC_*` environment
//! variables.
//!
//! The default file location is `~/.config/basic-remote-configs/config.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::cache::FileCacheProvider;
use crate::snapshot::DEFAULT_VERSION_KEY;
use crate::store::StoreError;

/// Application name used for config directory paths
const APP_NAME: &str = "basic-remote-configs";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_REMOTE_URL: &str = "BRC_REMOTE_URL";
const ENV_CACHE_PATH: &str = "BRC_CACHE_PATH";
const ENV_VERSION_KEY: &str = "BRC_VERSION_KEY";
const ENV_HEADERS: &str = "BRC_HEADERS";

fn default_version_key() -> String {
    DEFAULT_VERSION_KEY.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS * 1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub remote_url: String,
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
    #[serde(default = "default_version_key")]
    pub version_key: String,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl StoreConfig {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            custom_headers: HashMap::new(),
            version_key: default_version_key(),
            cache_path: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Sub-millisecond timeouts round up to one millisecond; zero stays zero
    /// and is rejected by `validate`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let mut millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 && !timeout.is_zero() {
            millis = 1;
        }
        self.request_timeout_ms = millis;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Config(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        std::fs::write(path, contents)
            .map_err(|e| StoreError::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Build a config from `BRC_*` environment variables.
    ///
    /// `BRC_HEADERS` holds `Name: value` pairs separated by `;`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let remote_url = lookup(ENV_REMOTE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| StoreError::Config(format!("{} is not set", ENV_REMOTE_URL)))?;

        let mut config = Self::new(remote_url.trim());
        if let Some(path) = lookup(ENV_CACHE_PATH).filter(|p| !p.is_empty()) {
            config.cache_path = Some(PathBuf::from(path));
        }
        if let Some(key) = lookup(ENV_VERSION_KEY).filter(|k| !k.is_empty()) {
            config.version_key = key;
        }
        if let Some(raw) = lookup(ENV_HEADERS) {
            for pair in raw.split(';').filter(|p| !p.trim().is_empty()) {
                let (name, value) = parse_header(pair)?;
                config.custom_headers.insert(name, value);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.remote_url.trim().is_empty() {
            return Err(StoreError::Config("remote_url is empty".to_string()));
        }
        if self.version_key.is_empty() {
            return Err(StoreError::Config("version_key is empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(StoreError::Config("request_timeout_ms must be above zero".to_string()));
        }
        Ok(())
    }

    /// Explicit `cache_path`, else the platform cache directory.
    pub fn resolve_cache_path(&self) -> Result<PathBuf, StoreError> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => FileCacheProvider::default_path()
                .ok_or_else(|| StoreError::Config("Could not find cache directory".to_string())),
        }
    }

    pub fn default_config_path() -> Result<PathBuf, StoreError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StoreError::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

/// Split `Name: value` into its trimmed parts.
pub fn parse_header(raw: &str) -> Result<(String, String), StoreError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| StoreError::Config(format!("Header {:?} is not `Name: value`", raw.trim())))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Config(format!("Header {:?} has no name", raw.trim())));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
