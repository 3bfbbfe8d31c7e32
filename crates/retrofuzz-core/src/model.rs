//! Data model shared by the matching pipeline and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The thumbnail kinds published per system on the libretro thumbnail server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailKind {
    Boxart,
    Snap,
    Title,
}

impl ThumbnailKind {
    /// All kinds, in the order the server directories are listed.
    pub const ALL: [ThumbnailKind; 3] = [
        ThumbnailKind::Boxart,
        ThumbnailKind::Snap,
        ThumbnailKind::Title,
    ];

    /// Directory name used both remotely and in the local thumbnail tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ThumbnailKind::Boxart => "Named_Boxarts",
            ThumbnailKind::Snap => "Named_Snaps",
            ThumbnailKind::Title => "Named_Titles",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dir_name() == name)
    }
}

impl fmt::Display for ThumbnailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A local catalog entry, as it appears in a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Raw label text, metadata groups included.
    pub text: String,
    /// Owning category (the playlist name).
    pub category: String,
}

impl Label {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A candidate name from a remote category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Exact remote file stem. This is the stable identifier of the entry.
    pub name: String,
    /// Remote category (system directory) the entry was listed under.
    pub category: String,
    /// Thumbnail kinds the server offers for this name.
    pub kinds: Vec<ThumbnailKind>,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            kinds: Vec::new(),
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ThumbnailKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Whether a cached entry records a fetch of exactly this remote entry.
    pub fn is_cached_as(&self, cached: &CacheEntry) -> bool {
        cached.remote.as_deref() == Some(self.name.as_str())
            && cached.category.as_deref() == Some(self.category.as_str())
    }
}

/// An artifact present in the local thumbnail cache for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw text of the owning label.
    pub label: String,
    /// Remote identifier the artifact was fetched from. `None` for files found
    /// on disk that no fetch recorded (untracked).
    pub remote: Option<String>,
    /// Remote category the artifact was fetched from, when known.
    pub category: Option<String>,
    /// File stem of the artifact inside each kind directory.
    pub stem: String,
    /// Kinds currently present on disk.
    pub kinds: Vec<ThumbnailKind>,
}

impl CacheEntry {
    pub fn is_untracked(&self) -> bool {
        self.remote.is_none()
    }

    /// Identifier for display purposes.
    pub fn display_id(&self) -> &str {
        self.remote.as_deref().unwrap_or(&self.stem)
    }
}

/// Why a chosen entry does not need a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// The same remote entry is already cached for this label.
    Cached,
    /// Another artifact already exists and merging sources is suppressed.
    MergeSuppressed,
    /// Files of unknown origin already sit at the label's own stem.
    Untracked,
}

/// Why a label produced no fetch at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// No candidate passed the score threshold.
    NoMatch { best_score: Option<u8> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMatch {
                best_score: Some(score),
            } => write!(f, "no match (best score {})", score),
            SkipReason::NoMatch { best_score: None } => write!(f, "no match (empty catalog)"),
        }
    }
}

/// The per-label output of reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Decision {
    Keep { remote: String, reason: KeepReason },
    Fetch(RemoteEntry),
    Delete(CacheEntry),
    Skip(SkipReason),
}

impl Decision {
    pub fn is_fetch(&self) -> bool {
        matches!(self, Decision::Fetch(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Decision::Delete(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Keep { remote, reason } => match reason {
                KeepReason::Cached => write!(f, "keep {}", remote),
                KeepReason::MergeSuppressed => write!(f, "keep existing (merge suppressed) {}", remote),
                KeepReason::Untracked => write!(f, "keep existing (untracked) {}", remote),
            },
            Decision::Fetch(entry) => write!(f, "fetch {}", entry.name),
            Decision::Delete(entry) => write!(f, "delete {}", entry.display_id()),
            Decision::Skip(reason) => write!(f, "skip: {}", reason),
        }
    }
}
