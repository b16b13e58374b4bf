//! WAYBILL - Version Index (In-Memory Sorted Map)
//! Holds every version of every key, oldest first per key.
//! The latest version of a key is its world state; the rest is history.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::types::{Key, KeyValue, Value, Version};

/// In-memory sorted index of key histories backed by a BTreeMap.
pub struct VersionIndex {
    /// Key -> versions in append order. Never empty once a key is present.
    versions: BTreeMap<Key, Vec<Version>>,
    /// Number of keys whose latest version is not a tombstone.
    live: usize,
    /// Total number of versions across all keys.
    version_count: usize,
}

impl VersionIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self {
            versions: BTreeMap::new(),
            live: 0,
            version_count: 0,
        }
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no key is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of versions appended so far, tombstones included.
    pub fn version_count(&self) -> usize {
        self.version_count
    }

    /// Append a version to `key`'s history.
    pub fn append(&mut self, key: Key, version: Version) {
        let was_live = self.is_live(&key);
        let now_live = !version.is_tombstone();
        self.versions.entry(key).or_default().push(version);
        self.version_count += 1;
        match (was_live, now_live) {
            (false, true) => self.live += 1,
            (true, false) => self.live -= 1,
            _ => {}
        }
    }

    /// Latest value for `key`.
    /// Returns `None` if the key was never written or its latest version is a tombstone.
    pub fn latest(&self, key: &[u8]) -> Option<&Value> {
        self.versions
            .get(key)
            .and_then(|history| history.last())
            .and_then(|version| version.value.as_ref())
    }

    /// Check whether `key` currently holds a value.
    pub fn is_live(&self, key: &[u8]) -> bool {
        self.latest(key).is_some()
    }

    /// Live entries with `start <= key < end`; an empty bound is open.
    pub fn live_range(&self, start: &[u8], end: &[u8]) -> Vec<KeyValue> {
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Vec::new();
        }
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        self.versions
            .range::<[u8], _>((lower, upper))
            .filter_map(|(key, history)| {
                let value = history.last()?.value.as_ref()?;
                Some(KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect()
    }

    /// All versions of `key`, newest first.
    pub fn history(&self, key: &[u8]) -> Vec<Version> {
        self.versions
            .get(key)
            .map(|history| history.iter().rev().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self::new()
    }
}
