//! Remote catalog backed by the libretro thumbnail server.
//!
//! The server publishes plain directory indexes: the root lists one directory
//! per system, and each system has `Named_Boxarts/`, `Named_Snaps/` and
//! `Named_Titles/` listings of percent-encoded PNG names. Any of the three may
//! be missing.

use crate::config::{NetworkConfig, PathsConfig};
use crate::model::{RemoteEntry, ThumbnailKind};
use crate::network::HttpClient;
use crate::traits::CatalogSource;
use crate::{Result, RetrofuzzError};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).unwrap());

/// Percent-decoded link targets of a directory index, in page order.
pub fn parse_links(html: &str) -> Vec<String> {
    HREF.captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            urlencoding::decode(m.as_str())
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| m.as_str().to_string())
        })
        .collect()
}

/// System directory names of the server root index.
pub fn parse_systems(html: &str) -> Vec<String> {
    parse_links(html)
        .into_iter()
        .filter(|link| link.ends_with('/') && !link.ends_with("../") && !link.starts_with('/'))
        .map(|link| link.trim_end_matches('/').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Thumbnail names (file stems) of a kind index.
pub fn parse_thumbnail_names(html: &str) -> Vec<String> {
    let suffix = format!(".{}", PathsConfig::THUMBNAIL_EXTENSION);
    parse_links(html)
        .into_iter()
        .filter_map(|link| {
            let file = link.rsplit('/').next()?;
            file.strip_suffix(&suffix).map(str::to_string)
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// URL of one thumbnail.
pub fn thumbnail_url(base_url: &str, system: &str, kind: ThumbnailKind, name: &str) -> String {
    format!(
        "{}/{}/{}/{}.{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(system),
        kind.dir_name(),
        urlencoding::encode(name),
        PathsConfig::THUMBNAIL_EXTENSION
    )
}

/// Merge per-kind name lists into entries, first appearance order.
pub fn merge_kinds(system: &str, listings: Vec<(ThumbnailKind, Vec<String>)>) -> Vec<RemoteEntry> {
    let mut entries: Vec<RemoteEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (kind, names) in listings {
        for name in names {
            match index.get(&name) {
                Some(&i) => {
                    if !entries[i].kinds.contains(&kind) {
                        entries[i].kinds.push(kind);
                    }
                }
                None => {
                    index.insert(name.clone(), entries.len());
                    entries.push(RemoteEntry::new(name, system).with_kinds([kind]));
                }
            }
        }
    }
    entries
}

/// The libretro thumbnail server.
#[derive(Debug, Clone)]
pub struct ThumbnailServer {
    http: HttpClient,
    base_url: String,
}

impl ThumbnailServer {
    pub fn new() -> Result<Self> {
        Self::with_base_url(NetworkConfig::THUMBNAIL_SERVER)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RetrofuzzError::config("thumbnail server URL must not be empty"));
        }
        Ok(Self {
            http: HttpClient::with_timeout(NetworkConfig::LISTING_TIMEOUT)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn kind_url(&self, system: &str, kind: ThumbnailKind) -> String {
        format!(
            "{}/{}/{}/",
            self.base_url,
            urlencoding::encode(system),
            kind.dir_name()
        )
    }
}

#[async_trait]
impl CatalogSource for ThumbnailServer {
    async fn categories(&self) -> Result<Vec<String>> {
        let html = self
            .http
            .get_text(&format!("{}/", self.base_url))
            .await
            .map_err(|e| RetrofuzzError::CatalogUnavailable {
                category: self.base_url.clone(),
                message: e.to_string(),
            })?;
        let systems = parse_systems(&html);
        debug!("{} systems listed at {}", systems.len(), self.base_url);
        Ok(systems)
    }

    async fn entries(&self, category: &str) -> Result<Vec<RemoteEntry>> {
        let mut listings = Vec::with_capacity(ThumbnailKind::ALL.len());
        for kind in ThumbnailKind::ALL {
            let url = self.kind_url(category, kind);
            let names = match self.http.get_text(&url).await {
                Ok(html) => parse_thumbnail_names(&html),
                Err(RetrofuzzError::NotFound { .. }) => {
                    warn!("{} has no {}", category, kind);
                    Vec::new()
                }
                Err(e) => {
                    return Err(RetrofuzzError::CatalogUnavailable {
                        category: category.to_string(),
                        message: e.to_string(),
                    })
                }
            };
            debug!("{}/{}: {} names", category, kind, names.len());
            listings.push((kind, names));
        }
        Ok(merge_kinds(category, listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = r#"<html><body><h1>Index of /</h1><pre>
<a href="../">../</a>
<a href="Atari%20-%202600/">Atari - 2600/</a>     01-Jan-2024 00:00  -
<a href="Nintendo%20-%20Game%20Boy/">Nintendo - Game Boy/</a>
<a href="README.md">README.md</a>
</pre></body></html>"#;

    const BOXARTS: &str = r#"<pre>
<a href="../">../</a>
<a href="Tetris%20%28World%29.png">Tetris (World).png</a>
<a href="Dr.%20Mario%20%28World%29.png">Dr. Mario (World).png</a>
<a href="Ren%20_%20Stimpy.png">Ren _ Stimpy.png</a>
<a href="notes.txt">notes.txt</a>
</pre>"#;

    #[test]
    fn test_parse_systems() {
        assert_eq!(parse_systems(ROOT), ["Atari - 2600", "Nintendo - Game Boy"]);
    }

    #[test]
    fn test_parse_thumbnail_names() {
        assert_eq!(
            parse_thumbnail_names(BOXARTS),
            ["Tetris (World)", "Dr. Mario (World)", "Ren _ Stimpy"]
        );
    }

    #[test]
    fn test_merge_kinds_keeps_first_order() {
        let entries = merge_kinds(
            "Nintendo - Game Boy",
            vec![
                (ThumbnailKind::Boxart, vec!["Tetris".into(), "Dr. Mario".into()]),
                (ThumbnailKind::Snap, vec!["Alleyway".into(), "Tetris".into()]),
                (ThumbnailKind::Title, vec![]),
            ],
        );
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Tetris", "Dr. Mario", "Alleyway"]);
        assert_eq!(entries[0].kinds, vec![ThumbnailKind::Boxart, ThumbnailKind::Snap]);
        assert_eq!(entries[2].kinds, vec![ThumbnailKind::Snap]);
        assert!(entries.iter().all(|e| e.category == "Nintendo - Game Boy"));
    }

    #[test]
    fn test_thumbnail_url_encoding() {
        assert_eq!(
            thumbnail_url(
                "https://thumbnails.libretro.com/",
                "Nintendo - Game Boy",
                ThumbnailKind::Title,
                "Tetris (World)"
            ),
            "https://thumbnails.libretro.com/Nintendo%20-%20Game%20Boy/Named_Titles/Tetris%20%28World%29.png"
        );
    }

    #[test]
    fn test_server_rejects_empty_url() {
        assert!(ThumbnailServer::with_base_url("/").is_err());
        let server = ThumbnailServer::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(server.base_url(), "http://localhost:8080");
    }
}
