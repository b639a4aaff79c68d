//! Stored forms of nodes and documents, and the batch that persists a node

use crate::config::GithubConfig;
use crate::error::StorageError;
use crate::store::keys;
use crate::store::BatchOp;
use crate::tree::hasher::content_key;
use crate::tree::node::{
    Breadcrumb, Meta, Node, NodeClass, NodeKind, NodeType, Search, View,
};
use crate::tree::route::Route;
use crate::types::{LocaleMap, NodeID};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Node as written under `nodes:{id}`; the parent is referenced by id only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNodeRecord {
    pub id: NodeID,
    #[serde(default)]
    pub parent: Option<NodeID>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub level: u32,
    pub title: LocaleMap<String>,
    pub hidden: LocaleMap<bool>,
    pub view: View,
    pub size: String,
    pub class: NodeClass,
    pub search: Search,
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(rename = "hasSource", default)]
    pub has_source: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistedNodeRecord {
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            parent: node.parent_id().map(str::to_string),
            node_type: node.node_type(),
            level: node.level,
            title: node.title.clone(),
            hidden: node.hidden.clone(),
            view: node.view,
            size: node.size.clone(),
            class: node.class,
            search: node.search,
            route: node.route.clone(),
            url: node.url.clone(),
            breadcrumbs: node.breadcrumbs.clone(),
            meta: node.meta.clone(),
            source: node.source.clone(),
            has_source: false,
            extra: node.extra.clone(),
        }
    }

    pub fn key(&self) -> String {
        keys::node_key(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    Public,
    Private,
}

/// Location of a document in a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    #[serde(rename = "type")]
    pub repo_type: RepoType,
    pub user: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub path: String,
    /// Edit entry point for the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,
}

impl RepoRef {
    /// Parse a repository blob URL: `https://{host}/{user}/{repo}/blob/{ref}/{path}`.
    ///
    /// `github.com` is public; the configured private host is private; any other
    /// host is not a repository URL.
    pub fn parse_url(url: &str, github: &GithubConfig) -> Option<RepoRef> {
        let url = Url::parse(url).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let host = url.host_str()?;
        let repo_type = if host == "github.com" || host == "www.github.com" {
            RepoType::Public
        } else if github.private_host.as_deref() == Some(host) {
            RepoType::Private
        } else {
            return None;
        };

        // Query and fragment are not part of the path segments
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let [user, repo, kind, reference, rest @ ..] = segments.as_slice() else {
            return None;
        };
        if !matches!(*kind, "blob" | "tree") || rest.is_empty() {
            return None;
        }
        let file_path = rest.join("/");

        let mut repo_ref = RepoRef {
            repo_type,
            user: user.to_string(),
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: file_path,
            prose: None,
        };
        repo_ref.prose = Some(repo_ref.prose_url(reference));
        Some(repo_ref)
    }

    /// Edit entry point on the given branch
    pub fn prose_url(&self, branch: &str) -> String {
        format!(
            "http://prose.io/#{}/{}/edit/{}/{}",
            self.user, self.repo, branch, self.path
        )
    }
}

/// Sync state of one remote document, stored under `docs:{hash}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Stable document URL; set to the content URL on first load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Last commit date, milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    /// Source URL before the first load, rendered HTML afterwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentRecord {
    /// Fresh record pointing at a repository document
    pub fn new(title: Option<String>, repo: RepoRef, content_url: &str) -> Self {
        Self {
            title,
            repo: Some(repo),
            etag: None,
            sha: None,
            url: None,
            edit_date: None,
            content: Some(content_url.to_string()),
            extra: Map::new(),
        }
    }

    /// Title, or the best available URL, for log lines
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.url.as_deref())
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

fn payload_key(category: &str, payload: &Value) -> Result<String, StorageError> {
    content_key(category, payload).map_err(|source| StorageError::Serialization {
        key: category.to_string(),
        source,
    })
}

/// `docs:` key for a document source URL.
///
/// Only the URL is hashed, so a title change keeps the document and its sync
/// state under the same key.
pub fn document_key(content_url: &str) -> Result<String, StorageError> {
    content_key(keys::DOCS_PREFIX.trim_end_matches(':'), content_url).map_err(|source| {
        StorageError::Serialization {
            key: keys::DOCS_PREFIX.to_string(),
            source,
        }
    })
}

/// Store operations for one node: payload puts, then the node put.
///
/// Block data and jsdoc are stored under content-addressed keys. Every locale
/// of a leaf's documentation source that points at a repository document gets
/// a `docs:` record. The node's references are rewritten to those keys.
pub fn persist(node: &Node, github: &GithubConfig) -> Result<Vec<BatchOp>, StorageError> {
    let mut record = PersistedNodeRecord::from_node(node);
    let mut ops = Vec::new();

    if let Some(Value::Object(source)) = record.source.as_mut() {
        match node.kind {
            NodeKind::LibraryBlock => {
                for (field, category) in [
                    ("data", keys::BLOCKS_DATA_PREFIX),
                    ("jsdoc", keys::BLOCKS_JSDOC_PREFIX),
                ] {
                    let Some(payload) = source.get(field).filter(|p| !p.is_null()) else {
                        continue;
                    };
                    let key = payload_key(category, payload)?;
                    ops.push(BatchOp::Put {
                        key: key.clone(),
                        value: payload.clone(),
                    });
                    source.insert(field.to_string(), Value::String(key));
                }
            }
            _ => {
                for (locale, descriptor) in source.iter_mut() {
                    let Some(descriptor) = descriptor.as_object_mut() else {
                        continue;
                    };
                    let Some(url) = descriptor.get("content").and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(repo) = RepoRef::parse_url(url, github) else {
                        continue;
                    };
                    let title = node.title.get(locale).cloned();
                    let document = DocumentRecord::new(title, repo, url);
                    let value = serde_json::to_value(&document).map_err(|source| {
                        StorageError::Serialization {
                            key: keys::DOCS_PREFIX.to_string(),
                            source,
                        }
                    })?;
                    let key = document_key(url)?;
                    ops.push(BatchOp::Put {
                        key: key.clone(),
                        value,
                    });
                    descriptor.insert("content".to_string(), Value::String(key));
                }
            }
        }
    }

    record.has_source = node.has_source();
    let key = record.key();
    ops.push(BatchOp::put(key, &record)?);
    Ok(ops)
}
