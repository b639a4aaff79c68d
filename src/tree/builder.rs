//! Tree construction from declarative model input

use crate::config::CatalogConfig;
use crate::error::ModelError;
use crate::tree::hasher::compute_node_id;
use crate::tree::library::{LibraryBlock, LibraryLevel, LibraryVersion};
use crate::tree::node::{
    normalize_hidden, normalize_title, Breadcrumb, Node, NodeKind, Search, View, DEFAULT_SIZE,
};
use crate::tree::route::{resolve_route, RouteResolution};
use crate::types::NodeID;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Raw keys with a dedicated slot on [`Node`]; everything else goes to `extra`.
const SLOT_KEYS: &[&str] = &[
    "id",
    "parent",
    "type",
    "level",
    "title",
    "hidden",
    "view",
    "size",
    "class",
    "search",
    "route",
    "url",
    "breadcrumbs",
    "meta",
    "source",
    "items",
    "lib",
];

/// Build one node from its raw record and resolved parent.
///
/// The steps run in a fixed order; each sees the outputs of the previous ones.
/// The id is taken from the raw record before anything else is applied.
pub fn build_node(
    raw: &Map<String, Value>,
    parent: Option<&Arc<Node>>,
    hint: Option<NodeKind>,
    config: &CatalogConfig,
) -> Result<Node, ModelError> {
    let kind = NodeKind::infer(raw, hint);
    let id = compute_node_id(raw).map_err(|e| ModelError::InvalidField {
        field: "id".to_string(),
        reason: e.to_string(),
    })?;
    let parent = parent.cloned();

    let size = raw
        .get("size")
        .and_then(Value::as_str)
        .filter(|size| !size.is_empty())
        .unwrap_or(DEFAULT_SIZE)
        .to_string();
    let title = normalize_title(raw.get("title"), &config.languages, config.primary_language())?;
    let hidden = normalize_hidden(raw.get("hidden"), &config.languages)?;

    let source = raw.get("source").filter(|s| !s.is_null()).cloned();
    let declared_view = match raw.get("view") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_str().and_then(View::parse).ok_or_else(|| {
            ModelError::InvalidField {
                field: "view".to_string(),
                reason: format!("unknown view {}", value),
            }
        })?),
    };
    let view = kind.default_view(declared_view, source.is_some());

    let level = match parent.as_deref() {
        None => 0,
        Some(parent) if parent.kind.is_transparent() => parent.level,
        Some(parent) => parent.level + 1,
    };
    let class = kind.default_class();
    let search = Search::from_raw(raw.get("search"));

    let title_hint = title.get(config.primary_language()).cloned().unwrap_or_default();
    let resolution = resolve_route(
        parent.as_deref().map(|p| &p.route),
        raw.get("route").filter(|r| !r.is_null()),
        &title_hint,
    )?;
    let (route, url) = match resolution {
        RouteResolution::Resolved { route, url } => (route, Some(url)),
        RouteResolution::Inherited(route) => {
            let url = match raw.get("url") {
                None | Some(Value::Null) => None,
                Some(Value::String(url)) => Some(url.clone()),
                Some(other) => {
                    return Err(ModelError::InvalidField {
                        field: "url".to_string(),
                        reason: format!("expected string, got {}", other),
                    })
                }
            };
            (route, url)
        }
    };

    let mut breadcrumbs = parent
        .as_deref()
        .map(|p| p.breadcrumbs.clone())
        .unwrap_or_default();
    if let Some(url) = &url {
        breadcrumbs.push(Breadcrumb {
            title: title.clone(),
            url: url.clone(),
        });
    }

    let extra: Map<String, Value> = raw
        .iter()
        .filter(|(key, _)| !SLOT_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let mut node = Node {
        id,
        parent,
        kind,
        level,
        title,
        hidden,
        view,
        size,
        class,
        search,
        route,
        url,
        breadcrumbs,
        meta: Default::default(),
        source,
        extra,
    };
    node.meta = kind.derive_meta(&node, &config.languages);
    Ok(node)
}

/// Route-resolved catalog tree, in pre-order
#[derive(Debug, Default)]
pub struct NodeTree {
    nodes: Vec<Arc<Node>>,
    index: HashMap<NodeID, usize>,
}

impl NodeTree {
    /// Build the tree from the model root. Children are listed under `items`;
    /// a `lib` descriptor adds its blocks as children.
    pub fn build(root: &Value, config: &CatalogConfig) -> Result<Self, ModelError> {
        let root = root.as_object().ok_or_else(|| ModelError::InvalidField {
            field: "root".to_string(),
            reason: "model root must be an object".to_string(),
        })?;
        let mut tree = NodeTree::default();
        tree.add_subtree(root, None, config)?;
        debug!(nodes = tree.len(), "Built catalog tree");
        Ok(tree)
    }

    fn add_subtree(
        &mut self,
        raw: &Map<String, Value>,
        parent: Option<&Arc<Node>>,
        config: &CatalogConfig,
    ) -> Result<(), ModelError> {
        let node = self.insert(build_node(raw, parent, None, config)?);

        if let Some(items) = raw.get("items") {
            let items = items.as_array().ok_or_else(|| ModelError::InvalidField {
                field: "items".to_string(),
                reason: "expected a list of nodes".to_string(),
            })?;
            for item in items {
                let item = item.as_object().ok_or_else(|| ModelError::InvalidField {
                    field: "items".to_string(),
                    reason: format!("expected node object, got {}", item),
                })?;
                self.add_subtree(item, Some(&node), config)?;
            }
        }

        if let Some(lib) = raw.get("lib").filter(|lib| !lib.is_null()) {
            let version: LibraryVersion =
                serde_json::from_value(lib.clone()).map_err(|e| ModelError::InvalidField {
                    field: "lib".to_string(),
                    reason: e.to_string(),
                })?;
            for level in &version.levels {
                for block in &level.blocks {
                    self.add_library_block(&node, &version, level, block, config)?;
                }
            }
        }

        Ok(())
    }

    /// Add one library block as a child of `parent`
    pub fn add_library_block(
        &mut self,
        parent: &Arc<Node>,
        version: &LibraryVersion,
        level: &LibraryLevel,
        block: &LibraryBlock,
        config: &CatalogConfig,
    ) -> Result<Arc<Node>, ModelError> {
        let record = version.block_record(level, block);
        let node = build_node(&record, Some(parent), Some(NodeKind::LibraryBlock), config)?;
        Ok(self.insert(node))
    }

    fn insert(&mut self, node: Node) -> Arc<Node> {
        let node = Arc::new(node);
        // Identical raw records share an id; the first one stays addressable.
        self.index.entry(node.id.clone()).or_insert(self.nodes.len());
        self.nodes.push(Arc::clone(&node));
        node
    }

    pub fn root(&self) -> Option<&Arc<Node>> {
        self.nodes.first()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Node>> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc<Node>> + 'a {
        self.nodes
            .iter()
            .filter(move |node| node.parent_id() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
