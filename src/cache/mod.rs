//! Content-addressed, file-backed result cache.
//!
//! Each entry is one JSON file named `{key}.json` under the cache directory.
//! Entries are written atomically (temp file + rename) and expire lazily: a file
//! whose mtime is older than the TTL reads as a miss. Nothing sweeps the directory.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::result::DialecticResult;

/// Derive the cache key for a run.
///
/// SHA-256 over a key-sorted JSON object of the six inputs, hex-encoded. The key
/// depends on nothing else: no clock, no randomness.
pub fn compute_key(
    query: &str,
    model: &str,
    backend_identity: &str,
    format_version: &str,
    max_tokens: u32,
    debug: bool,
) -> String {
    let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
    fields.insert("backend", Value::from(backend_identity));
    fields.insert("debug", Value::from(debug));
    fields.insert("format_version", Value::from(format_version));
    fields.insert("max_tokens", Value::from(max_tokens));
    fields.insert("model", Value::from(model));
    fields.insert("query", Value::from(query));

    let canonical = serde_json::to_string(&fields).unwrap_or_else(|_| format!("{:?}", fields));
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// File-backed cache of [`DialecticResult`]s.
#[derive(Debug, Clone)]
pub struct ResultCache {
    directory: PathBuf,
    ttl: Option<Duration>,
}

impl ResultCache {
    /// Create a cache from configuration. The directory is created on first save.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_directory(&config.directory, config.ttl)
    }

    /// Create a cache rooted at `directory`.
    pub fn with_directory(directory: impl AsRef<Path>, ttl: Option<Duration>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ttl,
        }
    }

    /// Get the cache directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the entry for `key`, or `None` if the key is not a plain identifier.
    pub fn entry_path(&self, key: &str) -> Option<PathBuf> {
        is_valid_key(key).then(|| self.directory.join(format!("{}.json", key)))
    }

    /// Load an entry.
    ///
    /// Missing, unreadable, corrupted and expired entries all read as `None`.
    pub async fn load(&self, key: &str) -> Option<DialecticResult> {
        let path = self.entry_path(key)?;

        if let Some(ttl) = self.ttl {
            match tokio::fs::metadata(&path).await {
                Ok(meta) => {
                    if is_expired(meta.modified().ok(), ttl) {
                        debug!(key = %key, ttl_secs = ttl.as_secs_f64(), "Cache entry expired");
                        return None;
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(key = %key, "Cache miss");
                    return None;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to stat cache entry");
                    return None;
                }
            }
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str::<DialecticResult>(&content) {
            Ok(result) => {
                debug!(key = %key, "Cache hit");
                Some(result)
            }
            Err(e) => {
                warn!(
                    key = %key,
                    path = %path.display(),
                    error = %e,
                    "Corrupted cache entry, treating as miss"
                );
                None
            }
        }
    }

    /// Persist an entry atomically. Concurrent writers of the same key: last rename wins.
    pub async fn save(&self, key: &str, result: &DialecticResult) -> CacheResult<()> {
        let path = self.entry_path(key).ok_or_else(|| CacheError::InvalidKey {
            key: key.to_string(),
        })?;
        let payload = serde_json::to_vec_pretty(result)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| CacheError::Io {
                path: self.directory.clone(),
                source,
            })?;

        let temp_path = self
            .directory
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        if let Err(source) = tokio::fs::write(&temp_path, &payload).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Io {
                path: temp_path,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Io { path, source });
        }

        debug!(key = %key, bytes = payload.len(), "Cache entry saved");
        Ok(())
    }
}

fn is_expired(modified: Option<SystemTime>, ttl: Duration) -> bool {
    match modified {
        // Clock skew (mtime in the future) counts as fresh.
        Some(modified) => SystemTime::now()
            .duration_since(modified)
            .map(|age| age > ttl)
            .unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        compute_key("q", "m", "p:m", "1", 100, false)
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_is_pure() {
        assert_eq!(key(), key());
    }

    #[test]
    fn test_key_changes_with_each_input() {
        let base = key();
        let variants = [
            compute_key("q2", "m", "p:m", "1", 100, false),
            compute_key("q", "m2", "p:m", "1", 100, false),
            compute_key("q", "m", "p:m2", "1", 100, false),
            compute_key("q", "m", "p:m", "2", 100, false),
            compute_key("q", "m", "p:m", "1", 101, false),
            compute_key("q", "m", "p:m", "1", 100, true),
        ];
        for variant in variants {
            assert_ne!(variant, base);
        }
    }

    #[test]
    fn test_entry_path_rejects_traversal() {
        let cache = ResultCache::with_directory("/tmp/cache", None);
        assert!(cache.entry_path("../etc/passwd").is_none());
        assert!(cache.entry_path("").is_none());
        assert_eq!(
            cache.entry_path("abc123").unwrap(),
            PathBuf::from("/tmp/cache/abc123.json")
        );
    }

    #[test]
    fn test_is_expired() {
        let ttl = Duration::from_secs(10);
        let old = SystemTime::now() - Duration::from_secs(60);
        let fresh = SystemTime::now();
        let future = SystemTime::now() + Duration::from_secs(60);
        assert!(is_expired(Some(old), ttl));
        assert!(!is_expired(Some(fresh), ttl));
        assert!(!is_expired(Some(future), ttl));
        assert!(!is_expired(None, ttl));
    }
}
