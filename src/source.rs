//! Data source resolution for db-sage.
//!
//! Decides which SQLite file the rest of the tool operates on: an imported
//! file persisted under a fixed name, a previously cached sample, or a
//! freshly downloaded sample.

use crate::config::SourceConfig;
use crate::error::{Result, SageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Where the database bytes come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Bytes supplied by the user, persisted to the fixed uploaded path.
    Import(Vec<u8>),

    /// The sample database, cached locally and fetched on demand.
    Sample,
}

/// Fetches the sample database body from a URL.
#[async_trait]
pub trait SampleFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher used outside of tests.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SageError::source(format!("Failed to download sample database: {}", e)))?;

        if !response.status().is_success() {
            return Err(SageError::source(format!(
                "Sample database download failed with HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SageError::source(format!("Failed to read sample download: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

/// Resolves a [`DataSource`] to a local database file path.
pub struct SourceResolver<F = HttpFetcher> {
    config: SourceConfig,
    fetcher: F,
}

impl SourceResolver<HttpFetcher> {
    /// Creates a resolver that downloads over HTTP when the sample is missing.
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            fetcher: HttpFetcher::new(),
        }
    }
}

impl<F: SampleFetcher> SourceResolver<F> {
    /// Creates a resolver with a custom fetcher.
    pub fn with_fetcher(config: SourceConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Resolves the source to a local path, persisting or downloading as
    /// needed. The returned path always exists on success.
    pub async fn resolve(&self, source: &DataSource) -> Result<PathBuf> {
        match source {
            DataSource::Import(bytes) => self.persist_import(bytes).await,
            DataSource::Sample => self.ensure_sample().await,
        }
    }

    async fn persist_import(&self, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.config.uploaded_path();
        write_staged(&path, bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "imported database");
        Ok(path)
    }

    async fn ensure_sample(&self) -> Result<PathBuf> {
        let path = self.config.sample_path();
        if path.exists() {
            debug!(path = %path.display(), "sample database already cached");
            return Ok(path);
        }

        let url = self.config.sample_url()?;
        info!(%url, "fetching sample database");
        let bytes = self.fetcher.fetch(&url).await?;

        write_staged(&path, &bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "cached sample database");
        Ok(path)
    }
}

/// Writes through a `.part` file and renames into place, so an interrupted
/// write can never be mistaken for a complete database.
async fn write_staged(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SageError::source(format!(
                    "Failed to create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let mut staged = path.as_os_str().to_owned();
    staged.push(".part");
    let staged = PathBuf::from(staged);

    tokio::fs::write(&staged, bytes)
        .await
        .map_err(|e| SageError::source(format!("Failed to write {}: {}", staged.display(), e)))?;

    tokio::fs::rename(&staged, path).await.map_err(|e| {
        SageError::source(format!(
            "Failed to move {} into place: {}",
            staged.display(),
            e
        ))
    })?;

    Ok(())
}
