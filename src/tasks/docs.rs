//! Incremental document synchronization
//!
//! Each stored document record is re-fetched conditionally, diffed by the
//! remote checksum, rendered and written back. Records are processed in
//! fixed-size chunks: chunks run one after another, records within a chunk
//! run concurrently. A failing record never stops the batch.

use crate::changes::{ChangeCategory, ChangeEntry, ChangeSet};
use crate::error::{ApiError, DocError, SyncError};
use crate::remote::{ContentSource, FetchStatus};
use crate::render::{decode_content, MarkupRenderer};
use crate::store::{keys, put_as, KeyValueStore, RangeOptions, Record};
use crate::tree::{DocumentRecord, RepoRef};
use chrono::DateTime;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Final state of one record after a sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocOutcome {
    /// The remote answered "not modified" to the conditional request
    NotModified,
    /// Fetched, but the checksum matches the stored one
    Unchanged,
    Added,
    Modified,
    Failed(DocError),
}

/// Counts per outcome for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub total: usize,
    pub not_modified: usize,
    pub unchanged: usize,
    pub added: usize,
    pub modified: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl SyncReport {
    fn record(&mut self, outcome: &DocOutcome) {
        match outcome {
            DocOutcome::NotModified => self.not_modified += 1,
            DocOutcome::Unchanged => self.unchanged += 1,
            DocOutcome::Added => self.added += 1,
            DocOutcome::Modified => self.modified += 1,
            DocOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Document sync pipeline
pub struct DocsSync {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn ContentSource>,
    renderer: Arc<dyn MarkupRenderer>,
    changes: Arc<ChangeSet>,
    chunk_size: usize,
}

impl DocsSync {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn ContentSource>,
        renderer: Arc<dyn MarkupRenderer>,
        changes: Arc<ChangeSet>,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            source,
            renderer,
            changes,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Document records that point at a repository
    pub fn load_records(&self) -> Result<Vec<Record>, ApiError> {
        let records = self.store.get_by_criteria(
            &|record| {
                record.key.starts_with(keys::DOCS_PREFIX)
                    && record.value.get("repo").map_or(false, |repo| !repo.is_null())
            },
            &RangeOptions::between(keys::DOCS_PREFIX, keys::NODE_PREFIX),
        )?;
        Ok(records)
    }

    /// Synchronize every document record
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let records = self.load_records().map_err(|err| {
            let err = SyncError::common(err);
            error!(error = %err, "Document synchronization failed");
            err
        })?;
        info!(records = records.len(), chunk_size = self.chunk_size, "Synchronizing documents");

        let mut report = SyncReport {
            total: records.len(),
            ..SyncReport::default()
        };
        for chunk in records.chunks(self.chunk_size) {
            let outcomes = join_all(chunk.iter().map(|record| self.sync_record(record))).await;
            for outcome in &outcomes {
                report.record(outcome);
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            added = report.added,
            modified = report.modified,
            unchanged = report.unchanged + report.not_modified,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Documents were synchronized"
        );
        Ok(report)
    }

    /// Synchronize one record. Never fails: errors become `DocOutcome::Failed`.
    pub async fn sync_record(&self, record: &Record) -> DocOutcome {
        let doc: DocumentRecord = match record.decode() {
            Ok(doc) => doc,
            Err(err) => {
                warn!(key = %record.key, error = %err, "Malformed document record");
                return DocOutcome::Failed(DocError::MarkdownNotExists {
                    url: record.key.clone(),
                });
            }
        };
        let source_url = doc.content.clone().unwrap_or_default();

        let outcome = match self.try_sync(&record.key, doc).await {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(key = %record.key, error = %err, "Document sync error");
                DocOutcome::Failed(DocError::MarkdownNotExists { url: source_url })
            }
        };

        match &outcome {
            DocOutcome::Failed(err) => warn!(key = %record.key, error = %err, "Document skipped"),
            other => debug!(key = %record.key, outcome = ?other, "Document processed"),
        }
        outcome
    }

    async fn try_sync(&self, key: &str, mut doc: DocumentRecord) -> Result<DocOutcome, ApiError> {
        let source_url = doc.content.clone().unwrap_or_default();
        let Some(repo) = doc.repo.clone() else {
            return Ok(DocOutcome::Failed(DocError::MarkdownNotExists { url: source_url }));
        };
        let etag = doc.etag.clone();
        let conditional = etag.as_deref();

        let file = match self.source.fetch(&repo, conditional).await? {
            FetchStatus::NotModified => {
                debug!(document = doc.label(), "Document was not changed");
                return Ok(DocOutcome::NotModified);
            }
            FetchStatus::NotFound => {
                return Ok(DocOutcome::Failed(DocError::MarkdownNotExists { url: source_url }))
            }
            FetchStatus::Found(file) => file,
        };
        let Some(encoded) = file.content.filter(|c| !c.is_empty()) else {
            return Ok(DocOutcome::Failed(DocError::MarkdownInvalid { url: source_url }));
        };
        if doc.sha.as_deref() == Some(file.sha.as_str()) {
            return Ok(DocOutcome::Unchanged);
        }

        let prior_sha = doc.sha.replace(file.sha);
        doc.etag = file.etag;
        let outcome = if prior_sha.is_none() {
            doc.url = doc.content.clone();
            debug!(document = doc.label(), "New document was added");
            self.changes.add_added(
                ChangeCategory::Docs,
                ChangeEntry::new(doc.title.as_deref(), doc.content.as_deref()),
            );
            DocOutcome::Added
        } else {
            debug!(document = doc.label(), "Document was modified");
            self.changes.add_modified(
                ChangeCategory::Docs,
                ChangeEntry::new(doc.title.as_deref(), doc.url.as_deref()),
            );
            DocOutcome::Modified
        };

        let html = decode_content(&encoded).and_then(|text| self.renderer.render(&text));
        match html {
            Ok(html) => doc.content = Some(html),
            Err(err) => {
                debug!(document = doc.label(), error = %err, "Render failed");
                return Ok(DocOutcome::Failed(DocError::MarkdownInvalid { url: source_url }));
            }
        }

        self.refresh_edit_date(&mut doc, &repo, conditional).await;
        self.check_branch(&mut doc, repo, conditional).await?;

        put_as(self.store.as_ref(), key, &doc)?;
        Ok(outcome)
    }

    /// Set `editDate` from the latest commit touching the document. Best effort.
    async fn refresh_edit_date(&self, doc: &mut DocumentRecord, repo: &RepoRef, etag: Option<&str>) {
        let lookup_failure = || DocError::CommitLookupFailure {
            user: repo.user.clone(),
            repo: repo.repo.clone(),
            reference: repo.reference.clone(),
            path: repo.path.clone(),
        };

        let commits = match self.source.get_commits(repo, etag).await {
            Ok(commits) => commits,
            Err(err) => {
                warn!(error = %err, "{}", lookup_failure());
                return;
            }
        };
        let edit_date = commits
            .first()
            .and_then(|commit| DateTime::parse_from_rfc3339(&commit.committer_date).ok())
            .map(|date| date.timestamp_millis());

        match edit_date {
            Some(millis) => doc.edit_date = Some(millis),
            None => warn!("{}", lookup_failure()),
        }
    }

    /// Point the edit link at the default branch when the document's branch is gone
    async fn check_branch(
        &self,
        doc: &mut DocumentRecord,
        mut repo: RepoRef,
        etag: Option<&str>,
    ) -> Result<(), ApiError> {
        if self.source.branch_exists(&repo, &repo.reference, etag).await? {
            return Ok(());
        }
        let branch = self.source.default_branch(&repo).await?;
        debug!(
            repo = %repo.repo,
            missing = %repo.reference,
            default_branch = %branch,
            "Branch no longer exists"
        );
        repo.prose = Some(repo.prose_url(&branch));
        doc.repo = Some(repo);
        Ok(())
    }
}
