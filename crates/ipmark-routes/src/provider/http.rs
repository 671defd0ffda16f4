//! HTTP-based allocation provider with local file caching.
//!
//! Fetches delegated-stats files from registry mirrors and caches them to
//! the local filesystem. On fetch failure, falls back to the cached copy if
//! one exists, so an unreachable mirror degrades to slightly stale data
//! instead of an empty table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RoutesError;
use crate::parser::{Allocation, parse_delegated};

/// Default HTTP request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider that fetches a delegated-stats file from a URL with caching.
pub struct HttpProvider {
    url: String,
    cache_path: Option<PathBuf>,
    entity: String,
    timeout: Duration,
}

impl HttpProvider {
    /// Create a new HTTP provider.
    ///
    /// - `url`: remote delegated-stats file.
    /// - `cache_path`: optional local path for caching the fetched content.
    /// - `entity`: entity code whose IPv4 records to keep.
    pub fn new(
        url: impl Into<String>,
        cache_path: Option<PathBuf>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            cache_path,
            entity: entity.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the raw file content from the remote URL.
    pub async fn fetch(&self) -> Result<String, RoutesError> {
        tracing::debug!(url = %self.url, "fetching delegation file");

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RoutesError::Http(format!("failed to build HTTP client: {e}")))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RoutesError::Http(format!("HTTP request failed for {}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutesError::Http(format!("HTTP {} for {}", status, self.url)));
        }

        let content = response
            .text()
            .await
            .map_err(|e| RoutesError::Http(format!("failed to read response body: {e}")))?;

        tracing::debug!(url = %self.url, bytes = content.len(), "fetched delegation file");

        if let Some(ref cache_path) = self.cache_path {
            if let Err(e) = write_cache(cache_path, &content).await {
                tracing::warn!(path = %cache_path.display(), error = %e, "failed to write cache");
            }
        }

        Ok(content)
    }

    /// Load allocations: try the remote URL, fall back to cache on failure.
    pub async fn load(&self) -> Result<Vec<Allocation>, RoutesError> {
        match self.fetch().await {
            Ok(content) => Ok(self.parse(&content)),
            Err(fetch_err) => {
                if let Some(ref cache_path) = self.cache_path {
                    if cache_path.exists() {
                        tracing::warn!(
                            url = %self.url,
                            error = %fetch_err,
                            cache = %cache_path.display(),
                            "fetch failed, using cached delegation file"
                        );
                        let content = tokio::fs::read_to_string(cache_path).await?;
                        return Ok(self.parse(&content));
                    }
                }
                Err(fetch_err)
            }
        }
    }

    /// Load from cache only, without touching the network.
    pub fn load_cached(&self) -> Result<Option<Vec<Allocation>>, RoutesError> {
        match &self.cache_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                Ok(Some(self.parse(&content)))
            }
            _ => Ok(None),
        }
    }

    fn parse(&self, content: &str) -> Vec<Allocation> {
        parse_delegated(content, &self.entity)
    }

    /// Get the URL of this provider.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the cache path of this provider.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }
}

/// Write content to a cache file atomically (write-to-temp + rename).
///
/// This prevents truncated cache files if the process is killed mid-write.
/// On Windows, the destination is removed first since `rename` fails when
/// the target already exists.
async fn write_cache(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content).await?;
    #[cfg(target_os = "windows")]
    {
        let _ = tokio::fs::remove_file(path).await;
    }
    tokio::fs::rename(&tmp_path, path).await
}
