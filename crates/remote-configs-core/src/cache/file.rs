use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{CacheError, CacheProvider};
use crate::snapshot::ConfigSnapshot;

/// Application name used for the cache directory path
const APP_NAME: &str = "basic-remote-configs";

/// Cache file name
const CACHE_FILE: &str = "brc-cache.json";

/// Keeps the configuration document as one JSON file.
///
/// Every read or write opens its own handle on the blocking pool and closes it
/// before returning.
#[derive(Debug, Clone)]
pub struct FileCacheProvider {
    path: PathBuf,
}

impl FileCacheProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<platform cache dir>/basic-remote-configs/brc-cache.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join(APP_NAME).join(CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path) -> Result<Option<ConfigSnapshot>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read cache file: {}", path.display()))
        }
    };

    let configs = ConfigSnapshot::from_json_str(&contents)
        .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

    Ok(Some(configs))
}

/// Write to a sibling temp file, then rename it over the cache file.
fn save(path: &Path, contents: &str) -> std::result::Result<(), CacheError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| CacheError::io(parent, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| CacheError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| CacheError::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| CacheError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl CacheProvider for FileCacheProvider {
    async fn get(&self) -> Option<ConfigSnapshot> {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || load(&path)).await {
            Ok(Ok(configs)) => configs,
            Ok(Err(e)) => {
                debug!(path = %self.path.display(), error = %format!("{:#}", e), "Ignoring unreadable cache");
                None
            }
            Err(e) => {
                debug!(error = %e, "Cache read task failed");
                None
            }
        }
    }

    async fn set(&self, configs: &ConfigSnapshot) -> std::result::Result<(), CacheError> {
        let contents = configs.to_json_string()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save(&path, &contents)).await?
    }

    async fn last_modified(&self) -> Option<DateTime<Utc>> {
        let path = self.path.clone();
        let modified = tokio::task::spawn_blocking(move || {
            std::fs::metadata(&path).and_then(|metadata| metadata.modified())
        })
        .await
        .ok()?
        .ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    fn delete_cache_file(&self) -> std::result::Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&self.path, e)),
        }
    }
}
