//! Catalog node types and per-field normalization

use crate::error::ModelError;
use crate::tree::route::Route;
use crate::types::{Locale, LocaleMap, NodeID};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Default rendering size tag
pub const DEFAULT_SIZE: &str = "normal";

/// Concrete node variant
///
/// Containers and selectors are transparent grouping constructs: their
/// children sit on the same level as they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Container,
    Selector,
    Leaf,
    LibraryBlock,
}

impl NodeKind {
    /// Persisted `type` of the variant
    pub fn node_type(self) -> NodeType {
        match self {
            NodeKind::Container => NodeType::Group,
            NodeKind::Selector => NodeType::Select,
            NodeKind::Leaf | NodeKind::LibraryBlock => NodeType::Simple,
        }
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, NodeKind::Container | NodeKind::Selector)
    }
}

/// Declared node type as found in model input and persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Simple,
    Group,
    Select,
}

impl NodeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(NodeType::Simple),
            "group" => Some(NodeType::Group),
            "select" => Some(NodeType::Select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Index,
    Post,
    Posts,
    Author,
    Authors,
    Tags,
    Block,
}

impl View {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "index" => Some(View::Index),
            "post" => Some(View::Post),
            "posts" => Some(View::Posts),
            "author" => Some(View::Author),
            "authors" => Some(View::Authors),
            "tags" => Some(View::Tags),
            "block" => Some(View::Block),
            _ => None,
        }
    }
}

/// Storage/rendering discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    Base,
    Block,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeClass::Base => write!(f, "base"),
            NodeClass::Block => write!(f, "block"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "always" => Some(ChangeFreq::Always),
            "hourly" => Some(ChangeFreq::Hourly),
            "daily" => Some(ChangeFreq::Daily),
            "weekly" => Some(ChangeFreq::Weekly),
            "monthly" => Some(ChangeFreq::Monthly),
            "yearly" => Some(ChangeFreq::Yearly),
            "never" => Some(ChangeFreq::Never),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

pub const DEFAULT_PRIORITY: f64 = 0.5;

/// Sitemap indexing hints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            changefreq: ChangeFreq::default(),
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl Search {
    /// Each invalid or missing field falls back to its default on its own.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let Some(Value::Object(raw)) = raw else {
            return Search::default();
        };

        let changefreq = raw
            .get("changefreq")
            .and_then(Value::as_str)
            .and_then(ChangeFreq::parse)
            .unwrap_or_default();
        let priority = raw
            .get("priority")
            .and_then(Value::as_f64)
            .filter(|p| (0.0..=1.0).contains(p))
            .unwrap_or(DEFAULT_PRIORITY);

        Search {
            changefreq,
            priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub title: LocaleMap<String>,
    pub url: String,
}

/// Library block details attached to a block node's search metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub name: String,
    pub library: String,
    pub version: String,
    pub level: String,
    pub status: String,
}

/// Search-engine metadata for one locale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFields {
    #[serde(rename = "type")]
    pub kind: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockMeta>,
}

pub type Meta = LocaleMap<MetaFields>;

/// In-memory catalog node
///
/// Built once by the tree builder and immutable afterwards. The parent is held
/// by `Arc`; the stored form replaces it with the parent's id.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeID,
    pub parent: Option<Arc<Node>>,
    pub kind: NodeKind,
    pub level: u32,
    pub title: LocaleMap<String>,
    pub hidden: LocaleMap<bool>,
    pub view: View,
    pub size: String,
    pub class: NodeClass,
    pub search: Search,
    pub route: Route,
    pub url: Option<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub meta: Meta,
    pub source: Option<Value>,
    /// Raw fields without a dedicated slot, carried through verbatim
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref().map(|parent| parent.id.as_str())
    }

    pub fn has_source(&self) -> bool {
        self.source.as_ref().map_or(false, |source| !source.is_null())
    }

    /// Title in the given locale, empty when unknown
    pub fn title_in(&self, locale: &str) -> &str {
        self.title.get(locale).map(String::as_str).unwrap_or_default()
    }

    pub fn is_hidden_in(&self, locale: &str) -> bool {
        self.hidden.get(locale).copied().unwrap_or(false)
    }
}

/// Complete a title for every configured locale.
///
/// A string applies to all locales. A partial map is completed with the value
/// for `default_language`, or the first supplied value.
pub fn normalize_title(
    raw: Option<&Value>,
    languages: &[Locale],
    default_language: &str,
) -> Result<LocaleMap<String>, ModelError> {
    match raw {
        None | Some(Value::Null) => Ok(fill(languages, |_| String::new())),
        Some(Value::String(title)) => Ok(fill(languages, |_| title.clone())),
        Some(Value::Object(map)) => {
            let mut given = LocaleMap::new();
            for (locale, value) in map {
                let title = value.as_str().ok_or_else(|| ModelError::InvalidField {
                    field: format!("title.{}", locale),
                    reason: "expected string".to_string(),
                })?;
                given.insert(locale.clone(), title.to_string());
            }
            let fallback = given
                .get(default_language)
                .or_else(|| languages.iter().find_map(|l| given.get(l)))
                .or_else(|| given.values().next())
                .cloned()
                .unwrap_or_default();
            Ok(fill(languages, |locale| {
                given.get(locale).cloned().unwrap_or_else(|| fallback.clone())
            }))
        }
        Some(other) => Err(ModelError::InvalidField {
            field: "title".to_string(),
            reason: format!("expected string or locale map, got {}", other),
        }),
    }
}

/// Complete the hidden flags for every configured locale.
///
/// Accepts absent, a boolean, a list of locales hidden, or a locale map.
pub fn normalize_hidden(
    raw: Option<&Value>,
    languages: &[Locale],
) -> Result<LocaleMap<bool>, ModelError> {
    match raw {
        None | Some(Value::Null) => Ok(fill(languages, |_| false)),
        Some(Value::Bool(hidden)) => Ok(fill(languages, |_| *hidden)),
        Some(Value::Array(list)) => {
            let mut hidden_in = Vec::with_capacity(list.len());
            for item in list {
                let locale = item.as_str().ok_or_else(|| ModelError::InvalidField {
                    field: "hidden".to_string(),
                    reason: format!("expected locale code, got {}", item),
                })?;
                hidden_in.push(locale);
            }
            Ok(fill(languages, |locale| hidden_in.contains(&locale)))
        }
        Some(Value::Object(map)) => {
            let mut hidden = fill(languages, |_| false);
            for (locale, value) in map {
                let flag = value.as_bool().ok_or_else(|| ModelError::InvalidField {
                    field: format!("hidden.{}", locale),
                    reason: "expected boolean".to_string(),
                })?;
                if let Some(slot) = hidden.get_mut(locale) {
                    *slot = flag;
                }
            }
            Ok(hidden)
        }
        Some(other) => Err(ModelError::InvalidField {
            field: "hidden".to_string(),
            reason: format!("expected boolean, list or map, got {}", other),
        }),
    }
}

fn fill<T>(languages: &[Locale], mut value: impl FnMut(&str) -> T) -> LocaleMap<T> {
    languages
        .iter()
        .map(|locale| (locale.clone(), value(locale)))
        .collect()
}
