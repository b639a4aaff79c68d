//! In-memory key-value store, used by tests and dry runs.

use super::{BatchOp, KeyValueStore, RangeOptions, Record};
use crate::error::StorageError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ordered map behind a lock. Counts writes so callers can assert that a
/// run touched nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a write
    pub fn with_record(self, key: impl Into<String>, value: Value) -> Self {
        self.data.write().insert(key.into(), value);
        self
    }

    /// Number of `put` calls plus batch operations applied so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.data.write().insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut data = self.data.write();
        let count = ops.len();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Del { key } => {
                    data.remove(&key);
                }
            }
        }
        self.writes.fetch_add(count, Ordering::SeqCst);
        Ok(())
    }

    fn range_scan(&self, range: &RangeOptions) -> Result<Vec<Record>, StorageError> {
        Ok(self
            .data
            .read()
            .iter()
            .filter(|(key, _)| range.contains(key))
            .map(|(key, value)| Record {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }
}
