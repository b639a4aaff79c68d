//! Sled-backed key-value store.

use super::{BatchOp, KeyValueStore, RangeOptions, Record};
use crate::error::StorageError;
use serde_json::Value;
use std::ops::Bound;
use std::path::Path;

/// Persistent store on top of a sled tree. Values are JSON-encoded.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn encode(key: &str, value: &Value) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<Value, StorageError> {
        serde_json::from_slice(bytes).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(key, &bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let bytes = Self::encode(key, value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut batch = sled::Batch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    let bytes = Self::encode(&key, &value)?;
                    batch.insert(key.as_bytes(), bytes);
                }
                BatchOp::Del { key } => batch.remove(key.as_bytes()),
            }
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn range_scan(&self, range: &RangeOptions) -> Result<Vec<Record>, StorageError> {
        let lower = match &range.gte {
            Some(gte) => Bound::Included(gte.as_bytes().to_vec()),
            None => Bound::Unbounded,
        };
        let upper = match &range.lt {
            Some(lt) => Bound::Excluded(lt.as_bytes().to_vec()),
            None => Bound::Unbounded,
        };

        let mut records = Vec::new();
        for entry in self.db.range::<Vec<u8>, _>((lower, upper)) {
            let (key, bytes) = entry?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
            let value = Self::decode(&key, &bytes)?;
            records.push(Record { key, value });
        }
        Ok(records)
    }
}
