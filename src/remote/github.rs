//! GitHub REST client

use super::{Commit, ContentSource, FetchStatus, RemoteFile};
use crate::config::GithubConfig;
use crate::error::RemoteError;
use crate::tree::persist::RepoType;
use crate::tree::RepoRef;
use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!("catalog/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetails,
}

#[derive(Debug, Deserialize)]
struct CommitDetails {
    committer: CommitSignature,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

/// Client for public github.com and an optional private instance
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    public_api: String,
    private_api: Option<String>,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, RemoteError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            public_api: config.public_api.trim_end_matches('/').to_string(),
            private_api: config
                .private_api
                .as_ref()
                .map(|api| api.trim_end_matches('/').to_string()),
        })
    }

    fn repo_url(&self, repo: &RepoRef) -> Result<String, RemoteError> {
        let root = match repo.repo_type {
            RepoType::Public => self.public_api.as_str(),
            RepoType::Private => self
                .private_api
                .as_deref()
                .ok_or_else(|| RemoteError::MissingApiRoot("private".to_string()))?,
        };
        Ok(format!("{}/repos/{}/{}", root, repo.user, repo.repo))
    }

    fn get(&self, url: &str, etag: Option<&str>) -> RequestBuilder {
        let request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match etag {
            Some(etag) => request.header(IF_NONE_MATCH, etag),
            None => request,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        url: &str,
    ) -> Result<T, RemoteError> {
        response.json::<T>().await.map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn unexpected(status: StatusCode, url: &str) -> RemoteError {
        RemoteError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ContentSource for GithubClient {
    async fn fetch(&self, repo: &RepoRef, etag: Option<&str>) -> Result<FetchStatus, RemoteError> {
        let url = format!("{}/contents/{}", self.repo_url(repo)?, repo.path);
        debug!(url = %url, conditional = etag.is_some(), "Fetching document");

        let response = self
            .get(&url, etag)
            .query(&[("ref", repo.reference.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(FetchStatus::NotModified),
            StatusCode::NOT_FOUND => Ok(FetchStatus::NotFound),
            status if status.is_success() => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body: ContentsResponse = Self::decode(response, &url).await?;
                Ok(FetchStatus::Found(RemoteFile {
                    sha: body.sha,
                    etag,
                    content: body.content,
                }))
            }
            status => Err(Self::unexpected(status, &url)),
        }
    }

    async fn get_commits(
        &self,
        repo: &RepoRef,
        etag: Option<&str>,
    ) -> Result<Vec<Commit>, RemoteError> {
        let url = format!("{}/commits", self.repo_url(repo)?);
        let response = self
            .get(&url, etag)
            .query(&[("path", repo.path.as_str()), ("sha", repo.reference.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_MODIFIED | StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let commits: Vec<CommitResponse> = Self::decode(response, &url).await?;
                Ok(commits
                    .into_iter()
                    .map(|c| Commit {
                        sha: c.sha,
                        committer_date: c.commit.committer.date,
                    })
                    .collect())
            }
            status => Err(Self::unexpected(status, &url)),
        }
    }

    async fn branch_exists(
        &self,
        repo: &RepoRef,
        branch: &str,
        etag: Option<&str>,
    ) -> Result<bool, RemoteError> {
        let url = format!("{}/branches/{}", self.repo_url(repo)?, branch);
        let response = self.get(&url, etag).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::NOT_MODIFIED => Ok(true),
            status if status.is_success() => Ok(true),
            status => Err(Self::unexpected(status, &url)),
        }
    }

    async fn default_branch(&self, repo: &RepoRef) -> Result<String, RemoteError> {
        let url = self.repo_url(repo)?;
        let response = self.get(&url, None).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body: RepositoryResponse = Self::decode(response, &url).await?;
                Ok(body.default_branch)
            }
            status => Err(Self::unexpected(status, &url)),
        }
    }
}
