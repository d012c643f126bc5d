//! Build record cache.
//!
//! After a build, the records of every published article can be stored under
//! a configured key so other tools (a search index, a feed generator, a
//! dynamic front page) can pick them up without re-parsing the content tree.
//!
//! # Design
//!
//! Storage sits behind [`CacheStore`], a single `put` operation taking a key,
//! a JSON value, and a time to live. [`FileCache`] is the stock store: one
//! JSON file per key inside the cache directory.
//!
//! ## File layout
//!
//! Entries are named by the SHA-256 of the key so any key string maps to a
//! safe file name:
//!
//! ```text
//! .inkpress-cache/
//! └── 3f0a…c1.json   { "version": 1, "key": "blog.articles",
//!                      "expires_at": 1717286400, "value": [ … ] }
//! ```
//!
//! `expires_at` is in Unix seconds. An entry read at or after that moment is
//! treated as absent, as is an entry written with a different format version.

use crate::config::CacheConfig;
use crate::types::BuildRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Version of the cache entry format. Bump this to invalidate all existing
/// entries when the format changes.
const ENTRY_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value store for build output.
pub trait CacheStore {
    fn put(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> Result<(), CacheError>;
}

/// A stored cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub version: u32,
    pub key: String,
    pub expires_at: i64,
    pub value: serde_json::Value,
}

/// File-backed cache store.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    now: DateTime<Utc>,
}

impl FileCache {
    /// Store rooted at `dir`, timing entries from `now`.
    pub fn new(dir: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            dir: dir.into(),
            now,
        }
    }

    /// Path of the entry file for `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_key(key)))
    }

    /// Read a live entry. Missing, expired, unreadable and outdated entries
    /// are all `None`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let content = fs::read_to_string(self.entry_path(key)).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;
        if entry.version != ENTRY_VERSION || entry.key != key {
            return None;
        }
        (self.now.timestamp() < entry.expires_at).then_some(entry.value)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CacheStore for FileCache {
    fn put(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            version: ENTRY_VERSION,
            key: key.to_string(),
            expires_at: self.now.timestamp().saturating_add(ttl),
            value: value.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(self.entry_path(key), json)?;
        Ok(())
    }
}

/// SHA-256 of a cache key, as a hex string.
pub fn hash_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Store the build records when a cache key is configured.
///
/// Returns the key the records were stored under.
pub fn publish(
    store: &dyn CacheStore,
    config: &CacheConfig,
    records: &[BuildRecord],
) -> Result<Option<String>, CacheError> {
    let Some(key) = &config.key else {
        return Ok(None);
    };
    let value = serde_json::to_value(records)?;
    store.put(key, &value, Duration::from_secs(config.ttl))?;
    log::info!("cached {} records under '{}'", records.len(), key);
    Ok(Some(key.clone()))
}
