//! URL -> node key index used by the router

use super::ArtifactOutcome;
use crate::changes::ChangeSet;
use crate::error::ArtifactError;
use crate::store::{keys, BatchOp, KeyValueStore, RangeOptions};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Rebuild the `urls:` index from the stored node records.
///
/// Skipped when nothing changed, unless `always` is set.
pub fn build_url_index(
    store: &dyn KeyValueStore,
    changes: &ChangeSet,
    always: bool,
) -> Result<ArtifactOutcome, ArtifactError> {
    info!("Building url index");
    if !changes.should_rebuild(always) {
        warn!("No changes were made during this synchronization, url index is left as is");
        return Ok(ArtifactOutcome::SkippedNoChanges);
    }

    store.remove_by_prefix(keys::URL_PREFIX)?;

    let mut index: BTreeMap<String, String> = BTreeMap::new();
    for record in store.range_scan(&RangeOptions::prefix(keys::NODE_PREFIX))? {
        if let Some(url) = record.value.get("url").and_then(Value::as_str) {
            index.insert(url.to_string(), record.key);
        }
    }

    let entries = index.len();
    let ops: Vec<BatchOp> = index
        .into_iter()
        .map(|(url, node_key)| BatchOp::Put {
            key: keys::url_key(&url),
            value: Value::String(node_key),
        })
        .collect();
    if !ops.is_empty() {
        store.batch(ops)?;
    }

    info!(entries, "Url index was built");
    Ok(ArtifactOutcome::Built { entries })
}
