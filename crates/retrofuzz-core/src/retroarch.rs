//! RetroArch configuration file reading.
//!
//! `retroarch.cfg` is a flat list of `key = "value"` lines. Only the playlist
//! and thumbnail directories are needed here.

use crate::config::PathsConfig;
use crate::{Result, RetrofuzzError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const PLAYLIST_DIRECTORY_KEY: &str = "playlist_directory";
const THUMBNAILS_DIRECTORY_KEY: &str = "thumbnails_directory";

/// Directories configured in `retroarch.cfg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetroArchPaths {
    pub playlist_directory: PathBuf,
    pub thumbnails_directory: PathBuf,
}

/// `~/.config/retroarch/retroarch.cfg` or the platform equivalent.
pub fn default_cfg_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(PathsConfig::RETROARCH_DIR_NAME)
            .join(PathsConfig::RETROARCH_CFG_NAME)
    })
}

/// Parse `key = "value"` lines. Comments and malformed lines are skipped.
pub fn parse_cfg(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Resolve a configured directory.
///
/// `~` expands to the home directory; a leading `:` means relative to the
/// directory holding the configuration file.
pub fn expand_path(value: &str, cfg_dir: &Path) -> PathBuf {
    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if let Some(rest) = value.strip_prefix(':') {
        return cfg_dir.join(rest.trim_start_matches(['/', '\\']));
    }
    PathBuf::from(value)
}

/// Read the playlist and thumbnail directories from a configuration file.
pub fn load_paths(cfg: &Path) -> Result<RetroArchPaths> {
    if !cfg.is_file() {
        return Err(RetrofuzzError::FileNotFound(cfg.to_path_buf()));
    }
    let text = std::fs::read_to_string(cfg).map_err(|e| RetrofuzzError::io_with_path(e, cfg))?;
    let values = parse_cfg(&text);
    let cfg_dir = cfg.parent().unwrap_or_else(|| Path::new("."));

    let lookup = |key: &str| -> Result<PathBuf> {
        match values.get(key).map(String::as_str) {
            Some(value) if !value.is_empty() && value != "default" => Ok(expand_path(value, cfg_dir)),
            _ => Err(RetrofuzzError::config(format!(
                "{} does not set {}",
                cfg.display(),
                key
            ))),
        }
    };

    let paths = RetroArchPaths {
        playlist_directory: lookup(PLAYLIST_DIRECTORY_KEY)?,
        thumbnails_directory: lookup(THUMBNAILS_DIRECTORY_KEY)?,
    };
    debug!("RetroArch paths from {}: {:?}", cfg.display(), paths);
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_cfg() {
        let values = parse_cfg(
            "# comment\nplaylist_directory = \"~/.config/retroarch/playlists\"\n\
             video_fullscreen = \"false\"\nbroken line\nthumbnails_directory=\"/data/thumbs\"\n",
        );
        assert_eq!(values["playlist_directory"], "~/.config/retroarch/playlists");
        assert_eq!(values["thumbnails_directory"], "/data/thumbs");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_expand_path() {
        let cfg_dir = Path::new("/opt/retroarch");
        assert_eq!(expand_path("/data/thumbs", cfg_dir), PathBuf::from("/data/thumbs"));
        assert_eq!(
            expand_path(":/playlists", cfg_dir),
            PathBuf::from("/opt/retroarch/playlists")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/thumbs", cfg_dir), home.join("thumbs"));
        }
    }

    #[test]
    fn test_load_paths() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = temp_dir.path().join("retroarch.cfg");
        std::fs::write(
            &cfg,
            "playlist_directory = \"/data/playlists\"\nthumbnails_directory = \":/thumbnails\"\n",
        )
        .unwrap();
        let paths = load_paths(&cfg).unwrap();
        assert_eq!(paths.playlist_directory, PathBuf::from("/data/playlists"));
        assert_eq!(paths.thumbnails_directory, temp_dir.path().join("thumbnails"));
    }

    #[test]
    fn test_load_paths_errors() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = temp_dir.path().join("retroarch.cfg");
        assert!(matches!(load_paths(&cfg), Err(RetrofuzzError::FileNotFound(_))));

        std::fs::write(&cfg, "playlist_directory = \"/data/playlists\"\nthumbnails_directory = \"default\"\n").unwrap();
        assert!(matches!(load_paths(&cfg), Err(RetrofuzzError::Config { .. })));
    }
}
