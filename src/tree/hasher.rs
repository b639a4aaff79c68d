//! Hash computation for catalog nodes and payloads

use crate::types::NodeID;
use serde::Serialize;

/// Compute the NodeID for a node's attribute set
///
/// The attributes are serialized to JSON with keys in sorted order (serde_json
/// maps are ordered) and hashed with BLAKE3. Identical attributes always yield
/// the same id; the id says nothing about the node's position in the tree.
pub fn compute_node_id<T: Serialize + ?Sized>(attributes: &T) -> Result<NodeID, serde_json::Error> {
    let bytes = serde_json::to_vec(attributes)?;
    Ok(hash_bytes(&bytes))
}

/// Content-addressed store key for a payload: `{category}:{hash}`
pub fn content_key<T: Serialize + ?Sized>(
    category: &str,
    payload: &T,
) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(format!("{}:{}", category, hash_bytes(&bytes)))
}

fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}
