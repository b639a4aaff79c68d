//! CLI Tooling
//!
//! Command-line interface for the catalog sync targets.

use crate::config::{CatalogConfig, ConfigLoader};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::remote::GithubClient;
use crate::render::MarkdownRenderer;
use crate::store::SledStore;
use crate::target::{load_model, Target, TargetKind, TargetReport};
use crate::tasks::ArtifactOutcome;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Catalog CLI - route-resolved content trees and incremental document sync
#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Build the content catalog and synchronize its documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the node tree from a model file and persist it
    Nodes {
        /// JSON model declaration
        #[arg(long)]
        model: PathBuf,
    },
    /// Synchronize document records with the remote repositories
    Docs,
    /// Persist the model and synchronize documents in one run
    All {
        /// JSON model declaration
        #[arg(long)]
        model: PathBuf,
    },
}

impl Cli {
    /// Logging settings from the config file with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if self.log_file.is_some() {
            logging.file = self.log_file.clone();
        }
        logging
    }
}

/// Loaded configuration plus the opened store
pub struct CliContext {
    config: Arc<CatalogConfig>,
    store: Arc<SledStore>,
}

impl CliContext {
    /// Load and validate configuration from an explicit file or the workspace
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<CatalogConfig, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(workspace_root)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn new(workspace_root: &Path, config: CatalogConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_path(workspace_root)?;
        let store = Arc::new(SledStore::open(&store_path)?);
        info!(store = %store_path.display(), "Opened catalog store");

        Ok(Self {
            config: Arc::new(config),
            store,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Run a command and return its summary
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let (kind, model) = match command {
            Commands::Nodes { model } => (TargetKind::Nodes, Some(load_model(model)?)),
            Commands::Docs => (TargetKind::Docs, None),
            Commands::All { model } => (TargetKind::All, Some(load_model(model)?)),
        };

        let source = Arc::new(GithubClient::new(&self.config.github)?);
        let renderer = Arc::new(MarkdownRenderer::new());
        let target = Target::new(Arc::clone(&self.config), self.store.clone());
        let report = target
            .execute(kind, model.as_ref(), source, renderer)
            .await?;
        self.store.flush()?;

        Ok(format_report(kind, &report))
    }
}

fn format_outcome(outcome: Option<ArtifactOutcome>) -> String {
    match outcome {
        Some(ArtifactOutcome::Built { entries }) => format!("{} entries", entries),
        Some(ArtifactOutcome::SkippedNoChanges) => "skipped (no changes)".to_string(),
        Some(ArtifactOutcome::SkippedNoHosts) => "skipped (no hosts)".to_string(),
        None => "not run".to_string(),
    }
}

fn format_report(kind: TargetKind, report: &TargetReport) -> String {
    let mut lines = vec![format!("{} finished", kind.name())];
    if let Some(nodes) = &report.nodes {
        lines.push(format!(
            "nodes: {} total, {} added, {} modified, {} new documents",
            nodes.nodes, nodes.added, nodes.modified, nodes.documents
        ));
    }
    if let Some(docs) = &report.docs {
        lines.push(format!(
            "docs: {} total, {} added, {} modified, {} unchanged, {} failed in {} ms",
            docs.total,
            docs.added,
            docs.modified,
            docs.unchanged + docs.not_modified,
            docs.failed,
            docs.duration_ms
        ));
    }
    lines.push(format!("url index: {}", format_outcome(report.url_index)));
    lines.push(format!("sitemap: {}", format_outcome(report.sitemap)));
    lines.join("\n")
}
