//! Seen-event cache with time-threshold eviction.
//!
//! Each log group owns one [`SeenEvents`] partition, written only by that
//! group's worker. [`DedupCache`] is the container: its lock guards partition
//! creation and lookup, never the per-event path once a worker holds its
//! partition.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Event ids seen for a single log group, keyed to their ingestion time.
#[derive(Debug, Default, Clone)]
pub struct SeenEvents {
    entries: HashMap<String, i64>,
}

impl SeenEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event_id` at `ingestion_time`. Overwrites a previous entry.
    pub fn store(&mut self, event_id: &str, ingestion_time: i64) {
        self.entries.insert(event_id.to_string(), ingestion_time);
    }

    pub fn seen(&self, event_id: &str) -> bool {
        self.entries.contains_key(event_id)
    }

    /// Drop every entry strictly older than `threshold`. Returns the number
    /// of entries removed.
    pub fn evict(&mut self, threshold: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, ts| *ts >= threshold);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to one group's partition.
pub type Partition = Arc<Mutex<SeenEvents>>;

/// Container of per-group partitions.
#[derive(Debug, Default)]
pub struct DedupCache {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the partition for `group`. Concurrent first calls for
    /// the same group observe the same partition.
    pub fn partition(&self, group: &str) -> Partition {
        if let Some(p) = self
            .partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group)
        {
            return Arc::clone(p);
        }
        let mut map = self
            .partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(group.to_string()).or_default())
    }

    pub fn store(&self, group: &str, event_id: &str, ingestion_time: i64) {
        let partition = self.partition(group);
        let mut seen = partition.lock().unwrap_or_else(PoisonError::into_inner);
        seen.store(event_id, ingestion_time);
    }

    /// True iff `event_id` is cached for `group`. Unknown groups yield false
    /// and are not created.
    pub fn seen(&self, group: &str, event_id: &str) -> bool {
        let map = self
            .partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match map.get(group) {
            Some(p) => p
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .seen(event_id),
            None => false,
        }
    }

    pub fn evict(&self, group: &str, threshold: i64) -> usize {
        let partition = {
            let map = self
                .partitions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match map.get(group) {
                Some(p) => Arc::clone(p),
                None => return 0,
            }
        };
        let mut seen = partition.lock().unwrap_or_else(PoisonError::into_inner);
        seen.evict(threshold)
    }

    /// Number of groups with a partition.
    pub fn group_count(&self) -> usize {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
