//! Applying decisions to the thumbnail cache.

use crate::cache::ThumbnailStore;
use crate::cancel::CancellationToken;
use crate::catalog::thumbnail_url;
use crate::model::{Decision, Label, RemoteEntry, ThumbnailKind};
use crate::traits::{ArtifactDownloader, DecisionExecutor};
use crate::{Result, RetrofuzzError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const STAGED_SUFFIX: &str = ".staged";

struct Staged {
    kind: ThumbnailKind,
    staged: PathBuf,
    destination: PathBuf,
}

fn discard(staged: &[Staged]) {
    for file in staged {
        let _ = std::fs::remove_file(&file.staged);
    }
}

/// Undo a partially applied rename pass: `placed` already sit at their
/// destinations, the rest are still staged.
fn roll_back(placed: &[Staged], pending: &[Staged]) {
    for file in placed {
        let _ = std::fs::remove_file(&file.destination);
    }
    discard(pending);
}

/// Downloads fetched entries into the store and deletes reset ones.
///
/// All kinds of an entry are downloaded to staged files first and only moved
/// into place once every download finished, so a cancelled or failed fetch
/// leaves no artifact behind.
pub struct ThumbnailFetcher<D> {
    store: Arc<ThumbnailStore>,
    downloader: D,
    base_url: String,
    cancel: CancellationToken,
}

impl<D: ArtifactDownloader> ThumbnailFetcher<D> {
    pub fn new(
        store: Arc<ThumbnailStore>,
        downloader: D,
        base_url: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            downloader,
            base_url: base_url.into(),
            cancel,
        }
    }

    async fn fetch(&self, label: &Label, entry: &RemoteEntry) -> Result<()> {
        let stem = self.store.allocate_stem(label, entry)?;
        let mut staged: Vec<Staged> = Vec::with_capacity(entry.kinds.len());

        for kind in &entry.kinds {
            if let Err(e) = self.cancel.check() {
                discard(&staged);
                return Err(e.into());
            }

            let destination = self.store.artifact_path(*kind, &stem);
            let staged_path = PathBuf::from(format!("{}{}", destination.display(), STAGED_SUFFIX));
            let url = thumbnail_url(&self.base_url, &entry.category, *kind, &entry.name);

            match self.downloader.download(&url, &staged_path).await {
                Ok(bytes) => {
                    debug!("{} {}: {} bytes", entry.name, kind, bytes);
                    staged.push(Staged {
                        kind: *kind,
                        staged: staged_path,
                        destination,
                    });
                }
                Err(RetrofuzzError::NotFound { url }) => {
                    warn!("{} is listed but missing at {}", entry.name, url);
                }
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        if staged.is_empty() {
            return Err(RetrofuzzError::DownloadFailed {
                url: format!("{}/{}", entry.category, entry.name),
                message: "no thumbnail could be downloaded".to_string(),
            });
        }

        if let Err(e) = self.cancel.check() {
            discard(&staged);
            return Err(e.into());
        }

        let mut kinds = Vec::with_capacity(staged.len());
        for (i, file) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(&file.staged, &file.destination) {
                let (placed, pending) = staged.split_at(i);
                roll_back(placed, pending);
                return Err(RetrofuzzError::io_with_path(e, &file.destination));
            }
            kinds.push(file.kind);
        }

        self.store.commit(label, entry, &stem, kinds)?;
        info!("{} <- {} ({})", stem, entry.name, entry.category);
        Ok(())
    }
}

#[async_trait]
impl<D: ArtifactDownloader> DecisionExecutor for ThumbnailFetcher<D> {
    async fn apply(&self, label: &Label, decision: &Decision) -> Result<()> {
        match decision {
            Decision::Fetch(entry) => self.fetch(label, entry).await,
            Decision::Delete(entry) => {
                self.store.remove(entry)?;
                info!("{}: deleted {}", label.text, entry.display_id());
                Ok(())
            }
            Decision::Keep { .. } | Decision::Skip(_) => Ok(()),
        }
    }
}

/// Executor that only logs what would happen.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

#[async_trait]
impl DecisionExecutor for DryRunExecutor {
    async fn apply(&self, label: &Label, decision: &Decision) -> Result<()> {
        debug!("dry run: {}: {}", label.text, decision);
        Ok(())
    }
}
