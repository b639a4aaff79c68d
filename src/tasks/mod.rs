//! Sync tasks run by the catalog targets

pub mod docs;
pub mod nodes;
pub mod sitemap;
pub mod urls;

pub use docs::{DocOutcome, DocsSync, SyncReport};
pub use nodes::{persist_tree, NodesReport};
pub use sitemap::build_sitemap;
pub use urls::build_url_index;

/// Result of a derived-artifact task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Nothing changed during the run and rebuilding was not forced
    SkippedNoChanges,
    /// No site hosts are configured
    SkippedNoHosts,
    Built { entries: usize },
}

impl ArtifactOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, ArtifactOutcome::Built { .. })
    }
}
