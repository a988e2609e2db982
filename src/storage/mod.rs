//! Owned key-value store with an injected storage backend.
//!
//! Entries carry the time they were stored, an optional time-to-live and the
//! schema version of the store that wrote them. Expired entries and entries
//! written under another version read as absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::shared_data::current_timestamp;

/// Where serialized entries live.
pub trait StorageBackend {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Keeps every entry in a single JSON object on disk.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry<T> {
    value: T,
    stored_at: u64,
    ttl_secs: Option<u64>,
    version: u32,
}

pub struct KeyValueStore<B: StorageBackend> {
    backend: B,
    version: u32,
    default_ttl: Option<u64>,
}

impl<B: StorageBackend> KeyValueStore<B> {
    pub fn new(backend: B, version: u32, default_ttl: Option<u64>) -> Self {
        Self {
            backend,
            version,
            default_ttl,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.put_at(key, value, self.default_ttl, current_timestamp())
    }

    pub fn put_at<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
        now: u64,
    ) -> Result<()> {
        let entry = Entry {
            value,
            stored_at: now,
            ttl_secs,
            version: self.version,
        };
        self.backend.save(key, serde_json::to_string(&entry)?)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_at(key, current_timestamp())
    }

    /// Value stored under `key` if it is still fresh at `now` and was written
    /// by this schema version.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: u64) -> Result<Option<T>> {
        let Some(raw) = self.backend.load(key)? else {
            return Ok(None);
        };
        let entry: Entry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Discarding unreadable cache entry '{}': {}", key, e);
                return Ok(None);
            }
        };
        if entry.version != self.version {
            return Ok(None);
        }
        if let Some(ttl) = entry.ttl_secs {
            if now.saturating_sub(entry.stored_at) >= ttl {
                return Ok(None);
            }
        }
        Ok(Some(entry.value))
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }

    /// Drops entries that are expired at `now` or belong to another version.
    /// Returns how many were removed.
    pub fn purge_stale(&mut self, now: u64) -> Result<usize> {
        let mut removed = 0;
        for key in self.backend.keys()? {
            let fresh = self
                .get_at::<serde_json::Value>(&key, now)?
                .is_some();
            if !fresh {
                self.backend.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_within_ttl() {
        let mut store = KeyValueStore::new(MemoryBackend::new(), 1, None);
        store
            .put_at("answer", &"forty-two".to_string(), Some(60), 1_000)
            .unwrap();
        let hit: Option<String> = store.get_at("answer", 1_059).unwrap();
        assert_eq!(hit.as_deref(), Some("forty-two"));
    }

    #[test]
    fn test_expired_entry_reads_absent() {
        let mut store = KeyValueStore::new(MemoryBackend::new(), 1, None);
        store.put_at("k", &5u32, Some(60), 1_000).unwrap();
        assert_eq!(store.get_at::<u32>("k", 1_060).unwrap(), None);
    }

    #[test]
    fn test_other_version_reads_absent() {
        let mut old = KeyValueStore::new(MemoryBackend::new(), 1, None);
        old.put_at("k", &5u32, None, 0).unwrap();
        let upgraded = KeyValueStore::new(old.backend, 2, None);
        assert_eq!(upgraded.get_at::<u32>("k", 0).unwrap(), None);
    }

    #[test]
    fn test_purge_stale() {
        let mut store = KeyValueStore::new(MemoryBackend::new(), 1, None);
        store.put_at("fresh", &1u32, Some(100), 0).unwrap();
        store.put_at("stale", &2u32, Some(10), 0).unwrap();
        store.put_at("forever", &3u32, None, 0).unwrap();
        assert_eq!(store.purge_stale(50).unwrap(), 1);
        assert_eq!(store.get_at::<u32>("fresh", 50).unwrap(), Some(1));
        assert_eq!(store.get_at::<u32>("forever", 50).unwrap(), Some(3));
        assert_eq!(store.backend.keys().unwrap().len(), 2);
    }

    #[test]
    fn test_json_file_backend_persists() {
        let path = std::env::temp_dir().join(format!(
            "signal_grid_store_{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        {
            let mut store = KeyValueStore::new(JsonFileBackend::new(&path), 1, None);
            store.put_at("grid", &vec![3u32, 4], None, 0).unwrap();
        }
        let store = KeyValueStore::new(JsonFileBackend::new(&path), 1, None);
        assert_eq!(store.get_at::<Vec<u32>>("grid", 10).unwrap(), Some(vec![3, 4]));
        let _ = fs::remove_file(&path);
    }
}
