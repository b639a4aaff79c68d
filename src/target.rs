//! Sync targets: ordered task runs sharing one change set
//!
//! Every target ends by rebuilding the url index and the sitemap, each gated
//! by what the run changed.

use crate::changes::ChangeSet;
use crate::config::CatalogConfig;
use crate::error::{ApiError, ModelError};
use crate::remote::ContentSource;
use crate::render::MarkupRenderer;
use crate::store::KeyValueStore;
use crate::tasks::{
    build_sitemap, build_url_index, persist_tree, ArtifactOutcome, DocsSync, NodesReport,
    SyncReport,
};
use crate::tree::NodeTree;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Which tasks a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Build the tree from the model and persist it
    Nodes,
    /// Sync documents
    Docs,
    /// Both, in one run
    All,
}

impl TargetKind {
    pub fn name(self) -> &'static str {
        match self {
            TargetKind::Nodes => "NODES SYNCHRONIZATION",
            TargetKind::Docs => "DOCS SYNCHRONIZATION",
            TargetKind::All => "FULL SYNCHRONIZATION",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetReport {
    pub nodes: Option<NodesReport>,
    pub docs: Option<SyncReport>,
    pub url_index: Option<ArtifactOutcome>,
    pub sitemap: Option<ArtifactOutcome>,
}

/// Read a JSON model file
pub fn load_model(path: &Path) -> Result<Value, ModelError> {
    let load_error = |reason: String| ModelError::Load {
        path: path.display().to_string(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| load_error(e.to_string()))
}

/// Task runner over one store with a shared change set
pub struct Target {
    config: Arc<CatalogConfig>,
    store: Arc<dyn KeyValueStore>,
    changes: Arc<ChangeSet>,
}

impl Target {
    pub fn new(config: Arc<CatalogConfig>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            store,
            changes: Arc::new(ChangeSet::new()),
        }
    }

    pub fn changes(&self) -> &Arc<ChangeSet> {
        &self.changes
    }

    pub fn sync_nodes(&self, model: &Value) -> Result<NodesReport, ApiError> {
        let tree = NodeTree::build(model, &self.config)?;
        Ok(persist_tree(&tree, self.store.as_ref(), &self.changes, &self.config)?)
    }

    pub async fn sync_docs(
        &self,
        source: Arc<dyn ContentSource>,
        renderer: Arc<dyn MarkupRenderer>,
    ) -> Result<SyncReport, ApiError> {
        let sync = DocsSync::new(
            Arc::clone(&self.store),
            source,
            renderer,
            Arc::clone(&self.changes),
            self.config.sync.chunk_size,
        );
        Ok(sync.run().await?)
    }

    /// Rebuild the url index and the sitemap, each gated by the change set
    pub fn build_artifacts(&self) -> Result<(ArtifactOutcome, ArtifactOutcome), ApiError> {
        let url_index = build_url_index(self.store.as_ref(), &self.changes, self.config.development)?;
        let sitemap = build_sitemap(self.store.as_ref(), &self.changes, &self.config)?;
        Ok((url_index, sitemap))
    }

    pub async fn execute(
        &self,
        kind: TargetKind,
        model: Option<&Value>,
        source: Arc<dyn ContentSource>,
        renderer: Arc<dyn MarkupRenderer>,
    ) -> Result<TargetReport, ApiError> {
        let started = Instant::now();
        info!(target_name = kind.name(), "Starting target");
        let mut report = TargetReport::default();

        if matches!(kind, TargetKind::Nodes | TargetKind::All) {
            let model = model.ok_or_else(|| {
                ApiError::ConfigError(format!("{} requires a model file", kind.name()))
            })?;
            report.nodes = Some(self.sync_nodes(model)?);
        }

        if matches!(kind, TargetKind::Docs | TargetKind::All) {
            report.docs = Some(self.sync_docs(source, renderer).await?);
        }

        let (url_index, sitemap) = self.build_artifacts()?;
        report.url_index = Some(url_index);
        report.sitemap = Some(sitemap);

        info!(
            target_name = kind.name(),
            changed = self.changes.are_modified(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Target finished"
        );
        Ok(report)
    }
}
