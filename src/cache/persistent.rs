use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use directories::BaseDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const CACHE_FILE_SUFFIX: &str = ".cache.json";
const DEFAULT_TTL_HOURS: i64 = 24;

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// One cached payload with its lifecycle metadata. This is also the
/// on-disk file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: serde_json::Value,
    creation_time: i64,
    expiration_time: i64,
}

impl CacheEntry {
    fn new(data: serde_json::Value, expiration_time: i64) -> Self {
        Self {
            data,
            creation_time: now_millis(),
            expiration_time,
        }
    }

    fn is_expired(&self) -> bool {
        now_millis() > self.expiration_time
    }
}

/// Generic key→value store with per-entry absolute expiration.
///
/// Entries live in a memory map and are mirrored to one JSON file each,
/// so they survive a restart. Disk I/O is strictly best-effort: a failed
/// write degrades the entry to memory-only, a torn or corrupt file reads
/// as a miss and is deleted. Expiry is checked against the wall clock on
/// every read; an expired entry is evicted from both tiers as a side
/// effect of the read that found it.
#[derive(Debug)]
pub struct FileCache {
    cache_dir: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
    disk_enabled: bool,
}

impl FileCache {
    /// Cache under the default directory `~/.openmensa/cache`.
    pub fn new() -> Self {
        Self::with_dir(default_cache_dir())
    }

    /// Cache under a specific directory. If the directory cannot be
    /// created, the instance runs memory-only for its whole lifetime;
    /// this is decided here, not re-tried per operation.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();

        let disk_enabled = match fs::create_dir_all(&cache_dir) {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "failed to create cache directory {}: {err}; caching to memory only",
                    cache_dir.display()
                );
                false
            }
        };

        let entries = if disk_enabled {
            load_existing(&cache_dir)
        } else {
            HashMap::new()
        };

        Self {
            cache_dir,
            entries: Mutex::new(entries),
            disk_enabled,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Store with the default TTL of 24 hours.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        self.put_until(key, value, now_millis() + DEFAULT_TTL_HOURS * 60 * 60 * 1000);
    }

    /// Store with an absolute expiration timestamp (epoch millis).
    pub fn put_until<T: Serialize>(&self, key: &str, value: &T, expires_at_millis: i64) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("refusing to cache unserializable value for key {key:?}: {err}");
                return;
            }
        };

        let entry = CacheEntry::new(data, expires_at_millis);
        self.lock_entries().insert(key.to_owned(), entry.clone());
        self.persist(key, &entry);
    }

    /// The stored value for `key`, or `None` if missing or expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = {
            let mut entries = self.lock_entries();
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_expired() => {
                    entries.remove(key);
                    None
                }
                Some(entry) => Some(entry.clone()),
            }
        };

        let Some(entry) = entry else {
            // an expired read evicts the disk copy as well
            self.delete_file(key);
            return None;
        };

        match serde_json::from_value(entry.data) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("failed to deserialize cache entry for key {key:?}: {err}");
                self.remove(key);
                None
            }
        }
    }

    /// Expiry-aware existence check with the same eviction side effect
    /// as [`get`](Self::get).
    pub fn contains(&self, key: &str) -> bool {
        {
            let mut entries = self.lock_entries();
            match entries.get(key) {
                None => return false,
                Some(entry) if entry.is_expired() => {
                    entries.remove(key);
                }
                Some(_) => return true,
            }
        }

        // the lookup found an expired entry; evict the disk copy too
        self.delete_file(key);
        false
    }

    /// Returns whether an entry was actually removed from memory.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.lock_entries().remove(key).is_some();
        self.delete_file(key);
        removed
    }

    /// Sweeps every expired entry from memory and disk; returns the
    /// number removed.
    pub fn clear_expired(&self) -> usize {
        let expired: Vec<String> = {
            let mut entries = self.lock_entries();
            let keys: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        for key in &expired {
            self.delete_file(key);
        }
        expired.len()
    }

    /// Unconditional full eviction, memory and disk.
    pub fn clear_all(&self) {
        let keys: Vec<String> = {
            let mut entries = self.lock_entries();
            let keys = entries.keys().cloned().collect();
            entries.clear();
            keys
        };

        for key in &keys {
            self.delete_file(key);
        }
    }

    /// Every memory-resident key, expired entries included. Presence
    /// alone says nothing about freshness.
    pub fn keys(&self) -> Vec<String> {
        self.lock_entries().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    // a poisoned lock only means another caller panicked mid-operation;
    // the map itself is still usable
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(sanitize_key(key) + CACHE_FILE_SUFFIX)
    }

    fn persist(&self, key: &str, entry: &CacheEntry) {
        if !self.disk_enabled {
            return;
        }

        let json = match serde_json::to_string_pretty(entry) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to serialize cache entry for key {key:?}: {err}");
                return;
            }
        };

        if let Err(err) = fs::write(self.file_path(key), json) {
            log::warn!("failed to persist cache entry {key:?}: {err}");
        }
    }

    fn delete_file(&self, key: &str) {
        if !self.disk_enabled {
            return;
        }

        let path = self.file_path(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove cache file {}: {err}", path.display());
            }
        }
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}

fn default_cache_dir() -> PathBuf {
    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".openmensa").join("cache")
}

/// Characters outside `[A-Za-z0-9.-]` are not safe in file names across
/// platforms and are replaced.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Loads every persisted entry. Entries that are already expired or fail
/// to deserialize are deleted from disk and skipped; a single bad file
/// never aborts startup.
fn load_existing(cache_dir: &Path) -> HashMap<String, CacheEntry> {
    let mut entries = HashMap::new();

    let dir = match fs::read_dir(cache_dir) {
        Ok(dir) => dir,
        Err(err) => {
            log::warn!("failed to list cache directory {}: {err}", cache_dir.display());
            return entries;
        }
    };

    for file in dir.filter_map(Result::ok) {
        let file_name = file.file_name();
        let Some(key) = file_name
            .to_str()
            .and_then(|name| name.strip_suffix(CACHE_FILE_SUFFIX))
        else {
            continue;
        };

        let entry = fs::read_to_string(file.path())
            .map_err(anyhow::Error::from)
            .and_then(|content| Ok(serde_json::from_str::<CacheEntry>(&content)?));

        match entry {
            Ok(entry) if entry.is_expired() => {
                let _ = fs::remove_file(file.path());
            }
            Ok(entry) => {
                entries.insert(key.to_owned(), entry);
            }
            Err(err) => {
                log::warn!(
                    "failed to load cache entry from {}: {err}; deleting it",
                    file.path().display()
                );
                let _ = fs::remove_file(file.path());
            }
        }
    }

    entries
}
