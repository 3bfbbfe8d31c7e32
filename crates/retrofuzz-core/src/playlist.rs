//! RetroArch playlist (`.lpl`) reading.

use crate::config::PathsConfig;
use crate::model::Label;
use crate::{Result, RetrofuzzError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    label: String,
    #[serde(default)]
    path: String,
}

impl PlaylistItem {
    /// RetroArch shows the content file name when the label is empty.
    fn display_label(&self) -> Option<String> {
        let label = self.label.trim();
        if !label.is_empty() {
            return Some(label.to_string());
        }
        let path = self.path.split('#').next().unwrap_or_default();
        Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }
}

/// A loaded playlist.
#[derive(Debug, Clone)]
pub struct Playlist {
    /// File stem, which is also the thumbnail directory name.
    pub name: String,
    pub path: PathBuf,
    /// Distinct labels in playlist order.
    pub labels: Vec<Label>,
}

/// Name of a playlist file without its extension.
pub fn playlist_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// All `.lpl` files of a directory, sorted by name.
pub fn list_playlists(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RetrofuzzError::NotADirectory(dir.to_path_buf()));
    }
    let mut playlists: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| RetrofuzzError::io_with_path(e, dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == PathsConfig::PLAYLIST_EXTENSION)
        })
        .collect();
    playlists.sort();
    Ok(playlists)
}

/// Find the playlist called `name` (with or without extension). Without a
/// name, the directory must hold exactly one playlist.
pub fn resolve_playlist(dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let playlists = list_playlists(dir)?;
    match name {
        Some(name) => {
            let wanted = name
                .strip_suffix(&format!(".{}", PathsConfig::PLAYLIST_EXTENSION))
                .unwrap_or(name);
            playlists
                .into_iter()
                .find(|path| playlist_name(path) == wanted)
                .ok_or_else(|| RetrofuzzError::UnknownPlaylist {
                    name: name.to_string(),
                })
        }
        None => match playlists.as_slice() {
            [only] => Ok(only.clone()),
            [] => Err(RetrofuzzError::config(format!(
                "no playlists in {}",
                dir.display()
            ))),
            many => Err(RetrofuzzError::config(format!(
                "{} playlists found, choose one with --playlist: {}",
                many.len(),
                many.iter()
                    .map(|p| playlist_name(p))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        },
    }
}

/// Load a playlist and its distinct labels.
pub fn load_playlist(path: &Path) -> Result<Playlist> {
    let text = std::fs::read_to_string(path).map_err(|e| RetrofuzzError::io_with_path(e, path))?;
    let file: PlaylistFile = serde_json::from_str(&text).map_err(|e| RetrofuzzError::Json {
        message: format!("Failed to parse playlist {}: {}", path.display(), e),
        source: Some(e),
    })?;

    let name = playlist_name(path);
    let mut seen = HashSet::new();
    let labels: Vec<Label> = file
        .items
        .iter()
        .filter_map(PlaylistItem::display_label)
        .filter(|label| seen.insert(label.clone()))
        .map(|label| Label::new(label, name.clone()))
        .collect();

    if labels.is_empty() {
        return Err(RetrofuzzError::EmptyPlaylist {
            path: path.to_path_buf(),
        });
    }

    debug!(
        "Loaded {} labels from {} ({} items)",
        labels.len(),
        path.display(),
        file.items.len()
    );
    Ok(Playlist {
        name,
        path: path.to_path_buf(),
        labels,
    })
}
