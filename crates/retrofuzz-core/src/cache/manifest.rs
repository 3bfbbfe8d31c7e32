//! Per-playlist record of fetched thumbnails.

use super::atomic::{read_json, write_json};
use crate::config::PathsConfig;
use crate::model::{RemoteEntry, ThumbnailKind};
use crate::{Result, RetrofuzzError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const MANIFEST_VERSION: u32 = 1;

/// One successful fetch for a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub remote: String,
    pub category: String,
    pub stem: String,
    pub kinds: Vec<ThumbnailKind>,
    pub fetched_at: DateTime<Utc>,
}

impl ManifestRecord {
    pub fn new(entry: &RemoteEntry, stem: impl Into<String>, kinds: Vec<ThumbnailKind>) -> Self {
        Self {
            remote: entry.name.clone(),
            category: entry.category.clone(),
            stem: stem.into(),
            kinds,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_entry(&self, remote: &str, category: &str) -> bool {
        self.remote == remote && self.category == category
    }
}

/// Contents of `retrofuzz.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// Remote system the playlist was first filled from.
    #[serde(default)]
    pub source: Option<String>,
    /// Records keyed by raw label text.
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<ManifestRecord>>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            source: None,
            labels: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Load the manifest of a playlist thumbnail directory.
    ///
    /// Without a manifest, a plain-text `source` file holding the system name
    /// is honoured.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PathsConfig::MANIFEST_FILENAME);
        if let Some(manifest) = read_json::<Manifest>(&path)? {
            if manifest.version > MANIFEST_VERSION {
                return Err(RetrofuzzError::config(format!(
                    "{} has version {}, newer than supported {}",
                    path.display(),
                    manifest.version,
                    MANIFEST_VERSION
                )));
            }
            return Ok(manifest);
        }

        let legacy = dir.join(PathsConfig::LEGACY_SOURCE_FILENAME);
        let mut manifest = Manifest::default();
        if legacy.is_file() {
            let text =
                std::fs::read_to_string(&legacy).map_err(|e| RetrofuzzError::io_with_path(e, &legacy))?;
            manifest.source = text
                .lines()
                .next()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string);
            debug!("Read legacy source {:?} from {}", manifest.source, legacy.display());
        }
        Ok(manifest)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join(PathsConfig::MANIFEST_FILENAME), self)
    }

    pub fn records(&self, label: &str) -> &[ManifestRecord] {
        self.labels.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any record of any label uses `stem`.
    pub fn claims_stem(&self, stem: &str) -> bool {
        self.labels.values().flatten().any(|record| record.stem == stem)
    }

    /// Add or replace the record for (label, remote, category).
    pub fn upsert(&mut self, label: &str, record: ManifestRecord) {
        let records = self.labels.entry(label.to_string()).or_default();
        records.retain(|r| !r.is_entry(&record.remote, &record.category));
        records.push(record);
    }

    /// Drop the record using `stem` for a label. Returns whether one existed.
    pub fn remove(&mut self, label: &str, stem: &str) -> bool {
        let Some(records) = self.labels.get_mut(label) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.stem != stem);
        let removed = records.len() != before;
        if records.is_empty() {
            self.labels.remove(label);
        }
        removed
    }
}
