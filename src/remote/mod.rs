//! Remote content source
//!
//! The sync pipeline talks to the hosting API only through [`ContentSource`].
//! Conditional requests carry the document's stored etag.

pub mod github;

pub use github::GithubClient;

use crate::error::RemoteError;
use crate::tree::RepoRef;
use async_trait::async_trait;

/// Document contents as reported by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Remote checksum of the content
    pub sha: String,
    pub etag: Option<String>,
    /// Base64 payload; may contain line breaks
    pub content: Option<String>,
}

/// Outcome of a conditional fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    NotModified,
    NotFound,
    Found(RemoteFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    /// RFC 3339 committer date
    pub committer_date: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch a document, conditionally when `etag` is given
    async fn fetch(&self, repo: &RepoRef, etag: Option<&str>) -> Result<FetchStatus, RemoteError>;

    /// Commits touching the document's path on its ref, most recent first
    async fn get_commits(
        &self,
        repo: &RepoRef,
        etag: Option<&str>,
    ) -> Result<Vec<Commit>, RemoteError>;

    async fn branch_exists(
        &self,
        repo: &RepoRef,
        branch: &str,
        etag: Option<&str>,
    ) -> Result<bool, RemoteError>;

    async fn default_branch(&self, repo: &RepoRef) -> Result<String, RemoteError>;
}
