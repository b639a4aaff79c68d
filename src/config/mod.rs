//! Catalog configuration.
//!
//! Loaded once per process by [`ConfigLoader`] and threaded explicitly
//! through tree construction and the sync tasks.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use workspace::storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::types::Locale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

fn default_languages() -> Vec<Locale> {
    vec!["en".to_string()]
}

fn default_language() -> Locale {
    "en".to_string()
}

fn default_chunk_size() -> usize {
    10
}

fn default_public_api() -> String {
    "https://api.github.com".to_string()
}

/// Document sync settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Records processed concurrently per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Remote content API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API root for public repositories
    #[serde(default = "default_public_api")]
    pub public_api: String,

    /// API root for repositories hosted on a private GitHub Enterprise
    #[serde(default)]
    pub private_api: Option<String>,

    /// Web host of the private instance, used to recognise its blob URLs
    #[serde(default)]
    pub private_host: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            public_api: default_public_api(),
            private_api: None,
            private_host: None,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Configured locales; every locale-dependent node field is populated for each
    #[serde(default = "default_languages")]
    pub languages: Vec<Locale>,

    #[serde(default = "default_language")]
    pub default_language: Locale,

    /// Locale -> site origin used for sitemap `loc` values
    #[serde(default)]
    pub hosts: BTreeMap<Locale, String>,

    /// Development mode: derived artifacts are rebuilt even without changes
    #[serde(default)]
    pub development: bool,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            default_language: default_language(),
            hosts: BTreeMap::new(),
            development: false,
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            github: GithubConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Configuration with the given locales and everything else defaulted.
    pub fn with_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Locale>,
    {
        let languages: Vec<Locale> = languages.into_iter().map(Into::into).collect();
        let default_language = languages.first().cloned().unwrap_or_else(default_language);
        Self {
            languages,
            default_language,
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.languages.is_empty() {
            return Err(ApiError::ConfigError(
                "At least one language must be configured".to_string(),
            ));
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(ApiError::ConfigError(
                "Language codes cannot be empty".to_string(),
            ));
        }
        if self.sync.chunk_size == 0 {
            return Err(ApiError::ConfigError(
                "sync.chunk_size must be greater than zero".to_string(),
            ));
        }
        for (locale, host) in &self.hosts {
            let origin = Url::parse(host).ok();
            let is_origin = origin.as_ref().map_or(false, |url| {
                matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
            });
            if !is_origin {
                return Err(ApiError::ConfigError(format!(
                    "Host for locale '{}' must be an absolute http(s) origin: {}",
                    locale, host
                )));
            }
        }
        Ok(())
    }

    /// Locale used when a single display value is needed
    pub fn primary_language(&self) -> &str {
        if self.languages.contains(&self.default_language) {
            &self.default_language
        } else {
            self.languages
                .first()
                .map(String::as_str)
                .unwrap_or(self.default_language.as_str())
        }
    }
}
