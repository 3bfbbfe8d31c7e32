//! On-disk thumbnail cache of one playlist.
//!
//! Layout: `<thumbnails_dir>/<playlist>/<Named_Boxarts|Named_Snaps|Named_Titles>/<stem>.png`
//! plus `retrofuzz.json` in the playlist directory. Empty files count as
//! absent.

use super::manifest::{Manifest, ManifestRecord};
use crate::config::PathsConfig;
use crate::model::{CacheEntry, Label, RemoteEntry, ThumbnailKind};
use crate::naming::{numbered_stem, thumbnail_stem};
use crate::traits::CacheInspector;
use crate::{Result, RetrofuzzError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Thumbnail directory of a playlist and its manifest.
pub struct ThumbnailStore {
    root: PathBuf,
    manifest: Mutex<Manifest>,
}

impl ThumbnailStore {
    /// Open the cache of `playlist` under RetroArch's thumbnails directory.
    pub fn open(thumbnails_dir: &Path, playlist: &str) -> Result<Self> {
        if thumbnails_dir.exists() && !thumbnails_dir.is_dir() {
            return Err(RetrofuzzError::NotADirectory(thumbnails_dir.to_path_buf()));
        }
        let root = thumbnails_dir.join(playlist);
        let manifest = Manifest::load(&root)?;
        debug!(
            "Opened thumbnail store {} ({} labels recorded)",
            root.display(),
            manifest.labels.len()
        );
        Ok(Self {
            root,
            manifest: Mutex::new(manifest),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one artifact.
    pub fn artifact_path(&self, kind: ThumbnailKind, stem: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.{}", stem, PathsConfig::THUMBNAIL_EXTENSION))
    }

    /// System the playlist was first filled from.
    pub fn source(&self) -> Result<Option<String>> {
        Ok(self.lock()?.source.clone())
    }

    /// Whether a different system than `system` was recorded as the source.
    pub fn source_changed(&self, system: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .source
            .as_deref()
            .is_some_and(|source| source != system))
    }

    /// Record `system` as the source if none was recorded yet.
    pub fn record_source(&self, system: &str) -> Result<()> {
        let mut manifest = self.lock()?;
        if manifest.source.is_some() {
            return Ok(());
        }
        manifest.source = Some(system.to_string());
        manifest.save(&self.root)?;
        info!("Recorded {} as thumbnail source of {}", system, self.root.display());
        Ok(())
    }

    /// Pick the stem for a new artifact of `label`.
    ///
    /// The entry already recorded for `remote` keeps its stem. Otherwise the
    /// label's own stem is used when free, then `stem (2)`, `stem (3)`, ...
    pub fn allocate_stem(&self, label: &Label, remote: &RemoteEntry) -> Result<String> {
        let manifest = self.lock()?;
        if let Some(existing) = manifest
            .records(&label.text)
            .iter()
            .find(|r| r.is_entry(&remote.name, &remote.category))
        {
            return Ok(existing.stem.clone());
        }

        let base = thumbnail_stem(&label.text);
        let mut n = 1;
        loop {
            let stem = numbered_stem(&base, n);
            if !manifest.claims_stem(&stem) && self.kinds_on_disk(&stem).is_empty() {
                return Ok(stem);
            }
            n += 1;
        }
    }

    /// Record a completed fetch.
    pub fn commit(&self, label: &Label, remote: &RemoteEntry, stem: &str, kinds: Vec<ThumbnailKind>) -> Result<()> {
        let mut manifest = self.lock()?;
        manifest.upsert(&label.text, ManifestRecord::new(remote, stem, kinds));
        manifest.save(&self.root)
    }

    /// Delete a cached artifact and its record.
    pub fn remove(&self, entry: &CacheEntry) -> Result<()> {
        let kinds: &[ThumbnailKind] = if entry.is_untracked() {
            &ThumbnailKind::ALL
        } else {
            &entry.kinds
        };
        for kind in kinds {
            let path = self.artifact_path(*kind, &entry.stem);
            match fs::remove_file(&path) {
                Ok(()) => debug!("Deleted {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(RetrofuzzError::io_with_path(e, path)),
            }
        }

        let mut manifest = self.lock()?;
        if manifest.remove(&entry.label, &entry.stem) {
            manifest.save(&self.root)?;
        }
        Ok(())
    }

    /// Kinds with a non-empty file for `stem`.
    pub fn kinds_on_disk(&self, stem: &str) -> Vec<ThumbnailKind> {
        ThumbnailKind::ALL
            .into_iter()
            .filter(|kind| {
                fs::metadata(self.artifact_path(*kind, stem))
                    .map(|meta| meta.is_file() && meta.len() > 0)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Manifest>> {
        self.manifest.lock().map_err(|e| RetrofuzzError::Other(format!(
            "Failed to lock manifest of {}: {}",
            self.root.display(),
            e
        )))
    }
}

impl CacheInspector for ThumbnailStore {
    /// Recorded artifacts still on disk, plus an untracked entry when files
    /// exist at the label's own stem without any record claiming them.
    fn cached_entries(&self, label: &Label) -> Result<Vec<CacheEntry>> {
        let manifest = self.lock()?;
        let mut entries: Vec<CacheEntry> = manifest
            .records(&label.text)
            .iter()
            .filter_map(|record| {
                let present: Vec<ThumbnailKind> = self
                    .kinds_on_disk(&record.stem)
                    .into_iter()
                    .filter(|kind| record.kinds.contains(kind))
                    .collect();
                (!present.is_empty()).then(|| CacheEntry {
                    label: label.text.clone(),
                    remote: Some(record.remote.clone()),
                    category: Some(record.category.clone()),
                    stem: record.stem.clone(),
                    kinds: present,
                })
            })
            .collect();

        let stem = thumbnail_stem(&label.text);
        if !manifest.claims_stem(&stem) {
            let kinds = self.kinds_on_disk(&stem);
            if !kinds.is_empty() {
                entries.push(CacheEntry {
                    label: label.text.clone(),
                    remote: None,
                    category: None,
                    stem,
                    kinds,
                });
            }
        }

        Ok(entries)
    }
}
