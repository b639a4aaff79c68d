//! Persist a built tree into the store

use crate::changes::{ChangeCategory, ChangeEntry, ChangeSet};
use crate::config::CatalogConfig;
use crate::error::StorageError;
use crate::store::{keys, BatchOp, KeyValueStore};
use crate::tree::{persist, Node, NodeTree};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodesReport {
    pub nodes: usize,
    pub added: usize,
    pub modified: usize,
    /// Document records created for the first time
    pub documents: usize,
}

/// Write every node of the tree and its payloads.
///
/// Payload keys already in the store are not rewritten, so existing document
/// records keep their sync state. Only a changed title is carried into them. Nodes whose stored record is identical are
/// left alone.
pub fn persist_tree(
    tree: &NodeTree,
    store: &dyn KeyValueStore,
    changes: &ChangeSet,
    config: &CatalogConfig,
) -> Result<NodesReport, StorageError> {
    info!(nodes = tree.len(), "Persisting catalog nodes");
    let mut report = NodesReport::default();

    for node in tree.iter() {
        report.nodes += 1;
        let mut ops = Vec::new();
        let mut node_changed = false;

        for op in persist(node, &config.github)? {
            if let BatchOp::Put { key, value } = &op {
                if key.starts_with(keys::NODE_PREFIX) {
                    match store.get(key)? {
                        None => {
                            report.added += 1;
                            changes.add_added(ChangeCategory::Nodes, change_entry(node, config));
                            node_changed = true;
                        }
                        Some(existing) if existing != *value => {
                            report.modified += 1;
                            changes.add_modified(ChangeCategory::Nodes, change_entry(node, config));
                            node_changed = true;
                        }
                        Some(_) => {}
                    }
                } else if let Some(existing) = store.get(key)? {
                    // Payload keys are content-addressed; document keys carry sync state.
                    if key.starts_with(keys::DOCS_PREFIX) {
                        if let Some(op) = retitle_document(key, existing, value) {
                            ops.push(op);
                        }
                    }
                    continue;
                } else if key.starts_with(keys::DOCS_PREFIX) {
                    report.documents += 1;
                }
            }
            ops.push(op);
        }

        let has_new_payload = ops.iter().any(|op| !op.key().starts_with(keys::NODE_PREFIX));
        if node_changed || has_new_payload {
            debug!(node = %node.id, operations = ops.len(), "Writing node");
            store.batch(ops)?;
        }
    }

    info!(
        added = report.added,
        modified = report.modified,
        documents = report.documents,
        "Catalog nodes were persisted"
    );
    Ok(report)
}

/// Carry a renamed title into a stored document, leaving its sync state alone
fn retitle_document(key: &str, mut existing: Value, fresh: &Value) -> Option<BatchOp> {
    let title = fresh.get("title").cloned().unwrap_or(Value::Null);
    let record = existing.as_object_mut()?;
    if record.get("title").cloned().unwrap_or(Value::Null) == title {
        return None;
    }
    if title.is_null() {
        record.remove("title");
    } else {
        record.insert("title".to_string(), title);
    }
    Some(BatchOp::Put {
        key: key.to_string(),
        value: existing,
    })
}

fn change_entry(node: &Node, config: &CatalogConfig) -> ChangeEntry {
    ChangeEntry::new(
        Some(node.title_in(config.primary_language())),
        node.url.as_deref(),
    )
}
