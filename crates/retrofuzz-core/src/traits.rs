//! Collaborator seams of the matching core.
//!
//! The orchestrator only sees these traits; the thumbnail server, the on-disk
//! store and the download executor are interchangeable implementations.

use crate::model::{CacheEntry, Decision, Label, RemoteEntry};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Source of remote categories and their entries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Names of all remote categories.
    async fn categories(&self) -> Result<Vec<String>>;

    /// Entries of one category, in catalog order.
    async fn entries(&self, category: &str) -> Result<Vec<RemoteEntry>>;
}

/// Read access to the local artifact cache.
pub trait CacheInspector: Send + Sync {
    /// Artifacts currently cached for a label.
    fn cached_entries(&self, label: &Label) -> Result<Vec<CacheEntry>>;
}

/// Applies fetch and delete decisions.
#[async_trait]
pub trait DecisionExecutor: Send + Sync {
    async fn apply(&self, label: &Label, decision: &Decision) -> Result<()>;
}

/// Fetches one remote artifact to a local path.
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    /// Download `url` to `destination`, returning the number of bytes written.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}
