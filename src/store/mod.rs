//! Key-value store
//!
//! Every persisted record class lives under its own key prefix. The prefixes are
//! chosen so that their lexical order bounds each class for range scans:
//! `blocks:` < `docs:` < `nodes:` < `people:` < `urls:`.

pub mod memory;
pub mod persistence;

pub use memory::MemoryStore;
pub use persistence::SledStore;

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Key prefixes per record class
pub mod keys {
    pub const BLOCKS_DATA_PREFIX: &str = "blocks:data";
    pub const BLOCKS_JSDOC_PREFIX: &str = "blocks:jsdoc";
    pub const DOCS_PREFIX: &str = "docs:";
    pub const NODE_PREFIX: &str = "nodes:";
    pub const PEOPLE_PREFIX: &str = "people:";
    pub const URL_PREFIX: &str = "urls:";
    pub const SITEMAP_JSON: &str = "sitemapJson";
    pub const SITEMAP_XML: &str = "sitemapXml";

    /// Store key of a node record
    pub fn node_key(node_id: &str) -> String {
        format!("{}{}", NODE_PREFIX, node_id)
    }

    /// Store key of a URL index entry
    pub fn url_key(url: &str) -> String {
        format!("{}{}", URL_PREFIX, url)
    }
}

/// A stored key with its decoded JSON value
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub value: Value,
}

impl Record {
    /// Decode the value into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        serde_json::from_value(self.value.clone()).map_err(|source| {
            StorageError::Serialization {
                key: self.key.clone(),
                source,
            }
        })
    }
}

/// One operation of an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put { key: String, value: Value },
    Del { key: String },
}

impl BatchOp {
    /// Put operation for any serializable value
    pub fn put<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self, StorageError> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| StorageError::Serialization {
            key: key.clone(),
            source,
        })?;
        Ok(BatchOp::Put { key, value })
    }

    pub fn key(&self) -> &str {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Del { key } => key,
        }
    }
}

/// Bounds for a range scan: `gte <= key < lt`
#[derive(Debug, Clone, Default)]
pub struct RangeOptions {
    pub gte: Option<String>,
    pub lt: Option<String>,
    /// Hint to keep scanned pages cached; implementations may ignore it
    pub fill_cache: bool,
}

impl RangeOptions {
    pub fn between(gte: &str, lt: &str) -> Self {
        Self {
            gte: Some(gte.to_string()),
            lt: Some(lt.to_string()),
            fill_cache: true,
        }
    }

    /// Range covering every key that starts with `prefix`
    pub fn prefix(prefix: &str) -> Self {
        Self {
            gte: Some(prefix.to_string()),
            lt: prefix_upper_bound(prefix),
            fill_cache: true,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.gte.as_deref().map_or(true, |gte| key >= gte)
            && self.lt.as_deref().map_or(true, |lt| key < lt)
    }
}

/// Smallest string greater than every string starting with `prefix`
fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = char::from_u32(last as u32 + 1) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

/// Key-value store interface
///
/// Implementations must be safe to share between concurrent sync tasks.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError>;
    /// Apply all operations atomically
    fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError>;
    /// Records in key order within the range
    fn range_scan(&self, range: &RangeOptions) -> Result<Vec<Record>, StorageError>;

    /// Records in the range accepted by `predicate`
    fn get_by_criteria(
        &self,
        predicate: &dyn Fn(&Record) -> bool,
        range: &RangeOptions,
    ) -> Result<Vec<Record>, StorageError> {
        Ok(self
            .range_scan(range)?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }

    /// Delete every key starting with `prefix`; returns the number removed
    fn remove_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let ops: Vec<BatchOp> = self
            .range_scan(&RangeOptions::prefix(prefix))?
            .into_iter()
            .map(|record| BatchOp::Del { key: record.key })
            .collect();
        let removed = ops.len();
        if removed > 0 {
            self.batch(ops)?;
        }
        Ok(removed)
    }
}

/// Typed read helper
pub fn get_as<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Typed write helper
pub fn put_as<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.put(key, &value)
}
