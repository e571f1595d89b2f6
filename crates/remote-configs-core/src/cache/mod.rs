//! Local cache for the configuration document.
//!
//! This module provides the `CacheProvider` capability used by the store and
//! `FileCacheProvider`, which keeps the document as a single JSON file. The
//! file's modification time doubles as the cache timestamp.

pub mod error;
pub mod file;
pub mod provider;

pub use error::CacheError;
pub use file::FileCacheProvider;
pub use provider::CacheProvider;
