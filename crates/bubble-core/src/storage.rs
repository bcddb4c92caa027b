//! Local persistence contract.
//!
//! The whole map lives under one key as a JSON array of `BubbleRecord`s.
//! Reading never fails: a missing key or unreadable JSON is an empty map.

use crate::record::BubbleRecord;
use std::collections::HashMap;

/// Key under which the map is stored.
pub const STORAGE_KEY: &str = "bubble_mindmap_data";

/// Host key-value store (browser `localStorage`, a file, memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value. Hosts that can fail (quota, I/O) report it as `Err`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// In-memory store for tests and native hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the persisted map.
pub fn load_records(store: &dyn KeyValueStore) -> Vec<BubbleRecord> {
    let Some(json) = store.get(STORAGE_KEY) else {
        return Vec::new();
    };
    if json.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(&json) {
        Ok(records) => records,
        Err(e) => {
            log::warn!("stored map is unreadable, starting empty: {e}");
            Vec::new()
        }
    }
}

/// Persist the map. Failures are logged and reported as `false`.
pub fn save_records(store: &mut dyn KeyValueStore, records: &[BubbleRecord]) -> bool {
    let json = match serde_json::to_string(records) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("could not serialize map: {e}");
            return false;
        }
    };
    match store.set(STORAGE_KEY, &json) {
        Ok(()) => {
            log::trace!("saved {} bubbles", records.len());
            true
        }
        Err(e) => {
            log::warn!("could not save map: {e}");
            false
        }
    }
}
