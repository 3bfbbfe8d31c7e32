//! Streaming downloads into a temp file followed by an atomic rename.

use crate::config::NetworkConfig;
use crate::network::client::HttpClient;
use crate::network::retry::{retry_async, RetryConfig};
use crate::traits::ArtifactDownloader;
use crate::{Result, RetrofuzzError};
use async_trait::async_trait;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Downloads thumbnails with retry.
pub struct DownloadManager {
    http: Arc<HttpClient>,
    retry: RetryConfig,
}

impl DownloadManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    pub fn with_client(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Temp path used while `destination` is being written.
    pub fn temp_path(destination: &Path) -> PathBuf {
        PathBuf::from(format!(
            "{}{}",
            destination.display(),
            NetworkConfig::DOWNLOAD_TEMP_SUFFIX
        ))
    }

    /// Download `url` to `destination` once, without retrying.
    pub async fn download_once(&self, url: &str, destination: &Path) -> Result<u64> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RetrofuzzError::io_with_path(e, parent))?;
        }

        let temp_path = Self::temp_path(destination);
        match self.stream_to(url, &temp_path).await {
            Ok(bytes) => {
                std::fs::rename(&temp_path, destination).map_err(|e| {
                    let _ = std::fs::remove_file(&temp_path);
                    RetrofuzzError::Io {
                        message: format!("Failed to move download into place: {}", e),
                        path: Some(destination.to_path_buf()),
                        source: Some(e),
                    }
                })?;
                debug!("Downloaded {} bytes to {}", bytes, destination.display());
                Ok(bytes)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, temp_path: &Path) -> Result<u64> {
        let response = self.http.get(url).await?;
        let mut file =
            std::fs::File::create(temp_path).map_err(|e| RetrofuzzError::io_with_path(e, temp_path))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| RetrofuzzError::Network {
                message: format!("Error reading download stream: {}", e),
                source: Some(e),
            })?;
            file.write_all(&chunk)
                .map_err(|e| RetrofuzzError::io_with_path(e, temp_path))?;
            written += chunk.len() as u64;
        }

        file.sync_all()
            .map_err(|e| RetrofuzzError::io_with_path(e, temp_path))?;

        if written == 0 {
            return Err(RetrofuzzError::DownloadFailed {
                url: url.to_string(),
                message: "empty response".to_string(),
            });
        }
        Ok(written)
    }
}

#[async_trait]
impl ArtifactDownloader for DownloadManager {
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let (result, attempts) = retry_async(
            &self.retry,
            || self.download_once(url, destination),
            RetrofuzzError::is_retryable,
        )
        .await;
        if attempts > 1 && result.is_ok() {
            info!("Downloaded {} after {} attempts", url, attempts);
        }
        result
    }
}
