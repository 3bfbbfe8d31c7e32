//! Thin reqwest wrapper with retrofuzz's user agent and error mapping.

use crate::config::{AppConfig, NetworkConfig};
use crate::{Result, RetrofuzzError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// HTTP client used for listings and downloads.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Client with the download timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::DOWNLOAD_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| RetrofuzzError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`, failing on any non-success status.
    ///
    /// 404 maps to [`RetrofuzzError::NotFound`]; statuses worth retrying map to
    /// [`RetrofuzzError::Network`] so [`RetrofuzzError::is_retryable`] holds.
    pub async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RetrofuzzError::Timeout(self.timeout)
            } else {
                RetrofuzzError::Network {
                    message: format!("GET {} failed: {}", url, e),
                    source: Some(e),
                }
            }
        })?;

        check_status(response, url)
    }

    /// GET `url` and read the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| RetrofuzzError::Network {
            message: format!("Failed to read body of {}: {}", url, e),
            source: Some(e),
        })
    }

    /// Whether an HTTP status is worth retrying.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RetrofuzzError::NotFound {
            url: url.to_string(),
        });
    }
    let message = format!("{} returned {}", url, status);
    if HttpClient::is_retryable_status(status) {
        Err(RetrofuzzError::Network {
            message,
            source: None,
        })
    } else {
        Err(RetrofuzzError::DownloadFailed {
            url: url.to_string(),
            message,
        })
    }
}
