//! Change accumulator shared by the sync tasks
//!
//! Records what a run added or modified per artifact category. Derived
//! artifacts (URL index, sitemap) are only rebuilt when something changed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Artifact category a change belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Docs,
    Nodes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl ChangeEntry {
    pub fn new(title: Option<&str>, url: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            url: url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChanges {
    pub added: Vec<ChangeEntry>,
    pub modified: Vec<ChangeEntry>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Default)]
struct Partitions {
    docs: CategoryChanges,
    nodes: CategoryChanges,
}

impl Partitions {
    fn category_mut(&mut self, category: ChangeCategory) -> &mut CategoryChanges {
        match category {
            ChangeCategory::Docs => &mut self.docs,
            ChangeCategory::Nodes => &mut self.nodes,
        }
    }
}

/// Append-only change set, safe to share between concurrent sync tasks
#[derive(Debug, Default)]
pub struct ChangeSet {
    inner: Mutex<Partitions>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_added(&self, category: ChangeCategory, entry: ChangeEntry) {
        self.inner.lock().category_mut(category).added.push(entry);
    }

    pub fn add_modified(&self, category: ChangeCategory, entry: ChangeEntry) {
        self.inner.lock().category_mut(category).modified.push(entry);
    }

    /// True when any category has at least one entry
    pub fn are_modified(&self) -> bool {
        let inner = self.inner.lock();
        !inner.docs.is_empty() || !inner.nodes.is_empty()
    }

    /// Snapshot of one category
    pub fn category(&self, category: ChangeCategory) -> CategoryChanges {
        self.inner.lock().category_mut(category).clone()
    }

    /// Gate for derived artifacts: rebuild when something changed, or always
    /// in development mode.
    pub fn should_rebuild(&self, always: bool) -> bool {
        always || self.are_modified()
    }
}
