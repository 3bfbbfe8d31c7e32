//! HTTP access to the thumbnail server.
//!
//! - [`HttpClient`]: reqwest wrapper with status mapping
//! - [`DownloadManager`]: streaming download to a temp file, then rename
//! - [`retry_async`]: exponential backoff with jitter, used for downloads

mod client;
mod download;
mod retry;

pub use client::HttpClient;
pub use download::DownloadManager;
pub use retry::{retry_async, RetryConfig};
