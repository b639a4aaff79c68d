//! Per-variant behavior: kind inference, default view, class and search metadata

use crate::tree::node::{BlockMeta, Meta, MetaFields, Node, NodeClass, NodeKind, NodeType, View};
use crate::types::Locale;
use serde_json::{Map, Value};

impl NodeKind {
    /// Kind selected for a raw record.
    ///
    /// A declared `type` wins; otherwise an own route or a url make a leaf, and
    /// anything else groups its children. `source` only selects the view.
    pub fn infer(raw: &Map<String, Value>, hint: Option<NodeKind>) -> NodeKind {
        if let Some(hint) = hint {
            return hint;
        }
        match raw.get("type").and_then(Value::as_str).and_then(NodeType::parse) {
            Some(NodeType::Group) => NodeKind::Container,
            Some(NodeType::Select) => NodeKind::Selector,
            Some(NodeType::Simple) => NodeKind::Leaf,
            None if has_value(raw, "route") || has_value(raw, "url") => NodeKind::Leaf,
            None => NodeKind::Container,
        }
    }

    pub fn default_view(self, declared: Option<View>, has_source: bool) -> View {
        match self {
            NodeKind::LibraryBlock => View::Block,
            _ => declared.unwrap_or(if has_source { View::Post } else { View::Posts }),
        }
    }

    pub fn default_class(self) -> NodeClass {
        match self {
            NodeKind::LibraryBlock => NodeClass::Block,
            _ => NodeClass::Base,
        }
    }

    /// Search-engine metadata per locale; only library blocks carry any
    pub fn derive_meta(self, node: &Node, languages: &[Locale]) -> Meta {
        match self {
            NodeKind::LibraryBlock => block_meta(node, languages),
            _ => Meta::new(),
        }
    }
}

fn has_value(raw: &Map<String, Value>, key: &str) -> bool {
    raw.get(key).map_or(false, |value| !value.is_null())
}

fn condition<'a>(node: &'a Node, key: &str) -> &'a str {
    node.route
        .conditions
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn block_meta(node: &Node, languages: &[Locale]) -> Meta {
    let lib = condition(node, "lib");
    let version = condition(node, "version");
    let level = condition(node, "level");

    languages
        .iter()
        .map(|locale| {
            let name = node.title_in(locale);
            let fields = MetaFields {
                kind: "block".to_string(),
                keywords: vec![
                    "bem".to_string(),
                    "block".to_string(),
                    format!("{} {}", lib, name),
                    format!("{} {} {}", lib, version, name),
                    format!("{} {} {} {}", lib, version, name, level),
                ],
                block: Some(BlockMeta {
                    name: name.to_string(),
                    library: lib.to_string(),
                    version: version.to_string(),
                    level: level.to_string(),
                    status: "current".to_string(),
                }),
            };
            (locale.clone(), fields)
        })
        .collect()
}
