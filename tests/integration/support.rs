use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use catalog::config::{CatalogConfig, GithubConfig};
use catalog::error::{RemoteError, StorageError};
use catalog::remote::{Commit, ContentSource, FetchStatus, RemoteFile};
use catalog::store::{BatchOp, KeyValueStore, MemoryStore, RangeOptions, Record};
use catalog::tree::{DocumentRecord, RepoRef};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const COMMIT_DATE: &str = "2015-03-01T10:00:00Z";
pub const COMMIT_MILLIS: i64 = 1_425_204_000_000;

/// What the remote answers for one document path
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Current revision; answers 304 when the request carries `etag`
    File {
        sha: String,
        etag: String,
        content: Option<String>,
    },
    Missing,
    Failing,
}

impl Scripted {
    pub fn markdown(sha: &str, etag: &str, markdown: &str) -> Self {
        Scripted::File {
            sha: sha.to_string(),
            etag: etag.to_string(),
            content: Some(encode_wrapped(markdown)),
        }
    }

    pub fn raw(sha: &str, etag: &str, content: Option<&str>) -> Self {
        Scripted::File {
            sha: sha.to_string(),
            etag: etag.to_string(),
            content: content.map(str::to_string),
        }
    }
}

/// Base64 with a line break every 60 characters, like the contents API
pub fn encode_wrapped(text: &str) -> String {
    let encoded = STANDARD.encode(text);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|line| format!("{}\n", String::from_utf8_lossy(line)))
        .collect()
}

/// In-process content source answering from a script
#[derive(Default)]
pub struct ScriptedSource {
    files: HashMap<String, Scripted>,
    failing_commits: HashSet<String>,
    missing_branches: HashSet<String>,
    default_branch: String,
    fetches: Mutex<Vec<(String, Option<String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            default_branch: "master".to_string(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: &str, scripted: Scripted) -> Self {
        self.files.insert(path.to_string(), scripted);
        self
    }

    pub fn with_failing_commits(mut self, path: &str) -> Self {
        self.failing_commits.insert(path.to_string());
        self
    }

    pub fn with_missing_branch(mut self, branch: &str, default_branch: &str) -> Self {
        self.missing_branches.insert(branch.to_string());
        self.default_branch = default_branch.to_string();
        self
    }

    /// `(path, etag)` of every fetch, in call order
    pub fn fetches(&self) -> Vec<(String, Option<String>)> {
        self.fetches.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch(&self, repo: &RepoRef, etag: Option<&str>) -> Result<FetchStatus, RemoteError> {
        self.fetches
            .lock()
            .push((repo.path.clone(), etag.map(str::to_string)));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.files.get(&repo.path) {
            None | Some(Scripted::Missing) => Ok(FetchStatus::NotFound),
            Some(Scripted::Failing) => Err(RemoteError::Status {
                status: 500,
                url: repo.path.clone(),
            }),
            Some(Scripted::File { etag: current, .. }) if etag == Some(current.as_str()) => {
                Ok(FetchStatus::NotModified)
            }
            Some(Scripted::File { sha, etag, content }) => Ok(FetchStatus::Found(RemoteFile {
                sha: sha.clone(),
                etag: Some(etag.clone()),
                content: content.clone(),
            })),
        }
    }

    async fn get_commits(
        &self,
        repo: &RepoRef,
        _etag: Option<&str>,
    ) -> Result<Vec<Commit>, RemoteError> {
        if self.failing_commits.contains(&repo.path) {
            return Err(RemoteError::Status {
                status: 502,
                url: repo.path.clone(),
            });
        }
        Ok(vec![Commit {
            sha: "c0ffee".to_string(),
            committer_date: COMMIT_DATE.to_string(),
        }])
    }

    async fn branch_exists(
        &self,
        _repo: &RepoRef,
        branch: &str,
        _etag: Option<&str>,
    ) -> Result<bool, RemoteError> {
        Ok(!self.missing_branches.contains(branch))
    }

    async fn default_branch(&self, _repo: &RepoRef) -> Result<String, RemoteError> {
        Ok(self.default_branch.clone())
    }
}

/// Store whose scans always fail; point reads and writes succeed
#[derive(Default)]
pub struct BrokenScanStore {
    inner: MemoryStore,
}

impl KeyValueStore for BrokenScanStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.inner.put(key, value)
    }

    fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        self.inner.batch(ops)
    }

    fn range_scan(&self, _range: &RangeOptions) -> Result<Vec<Record>, StorageError> {
        Err(StorageError::InvalidKey("scan unavailable".to_string()))
    }
}

pub fn blob_url(branch: &str, path: &str) -> String {
    format!("https://github.com/owner/docs/blob/{}/{}", branch, path)
}

/// Never-synced document record for `path` on `branch`
pub fn fresh_document(title: &str, branch: &str, path: &str) -> DocumentRecord {
    let url = blob_url(branch, path);
    let repo = RepoRef::parse_url(&url, &GithubConfig::default()).unwrap();
    DocumentRecord::new(Some(title.to_string()), repo, &url)
}

/// Store seeded with `docs:{path}` records
pub fn seeded_store(documents: &[(&str, &DocumentRecord)]) -> MemoryStore {
    documents.iter().fold(MemoryStore::new(), |store, (key, doc)| {
        store.with_record(*key, serde_json::to_value(doc).unwrap())
    })
}

pub fn stored_document(store: &MemoryStore, key: &str) -> DocumentRecord {
    serde_json::from_value(store.get(key).unwrap().unwrap()).unwrap()
}

pub fn config() -> CatalogConfig {
    CatalogConfig::with_languages(["en", "ru"])
}
