//! Centralized configuration for retrofuzz.
//!
//! Constants for network operations and on-disk layout, plus [`MatchConfig`],
//! the single configuration value threaded through the matching pipeline.

use crate::filter::LabelFilter;
use crate::normalize::SubstitutionTable;
use crate::{Result, RetrofuzzError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "retrofuzz";
    pub const USER_AGENT: &'static str = concat!("retrofuzz/", env!("CARGO_PKG_VERSION"));
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const THUMBNAIL_SERVER: &'static str = "https://thumbnails.libretro.com";
    pub const LISTING_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DOWNLOAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DOWNLOAD_RETRY_ATTEMPTS: u32 = 3;
    pub const DOWNLOAD_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
}

/// Shared directory and file naming.
pub struct PathsConfig;

impl PathsConfig {
    pub const RETROARCH_DIR_NAME: &'static str = "retroarch";
    pub const RETROARCH_CFG_NAME: &'static str = "retroarch.cfg";
    pub const PLAYLIST_EXTENSION: &'static str = "lpl";
    pub const THUMBNAIL_EXTENSION: &'static str = "png";
    pub const MANIFEST_FILENAME: &'static str = "retrofuzz.json";
    pub const LEGACY_SOURCE_FILENAME: &'static str = "source";
}

/// Score range of the matcher.
pub struct ScoreConfig;

impl ScoreConfig {
    pub const MAX: u8 = 100;
    pub const DEFAULT_MIN: u8 = 90;
    pub const DEFAULT_LIMIT: usize = 1;
    /// Sentinel accepted by [`parse_min_score`] for an exact-only threshold.
    pub const EXACT_SENTINEL: &'static str = "exact";
}

/// Parse a minimum score: a number in `0..=100` or the `exact` sentinel.
pub fn parse_min_score(value: &str) -> Result<u8> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case(ScoreConfig::EXACT_SENTINEL) {
        return Ok(ScoreConfig::MAX);
    }
    let score: u8 = trimmed.parse().map_err(|_| {
        RetrofuzzError::config(format!(
            "invalid score {:?}: expected 0..={} or \"{}\"",
            value,
            ScoreConfig::MAX,
            ScoreConfig::EXACT_SENTINEL
        ))
    })?;
    if score > ScoreConfig::MAX {
        return Err(RetrofuzzError::config(format!(
            "score {} is above the maximum {}",
            score,
            ScoreConfig::MAX
        )));
    }
    Ok(score)
}

/// Toggles for the normalization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Strip `(...)` groups instead of keeping them.
    pub strip_round: bool,
    /// Keep `[...]` groups instead of stripping them.
    pub keep_square: bool,
    /// Drop the subtitle after the last `" - "`, `": "` or `"_ "`.
    pub strip_subtitle: bool,
    /// Remove whitespace entirely instead of collapsing it.
    pub remove_spaces: bool,
    /// With `remove_spaces`, upper-case the letter after each removed space.
    pub capitalize_words: bool,
    /// Use only the text before the first occurrence of this marker.
    pub before: Option<String>,
    pub substitutions: SubstitutionTable,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            strip_round: false,
            keep_square: false,
            strip_subtitle: false,
            remove_spaces: false,
            capitalize_words: false,
            before: None,
            substitutions: SubstitutionTable::default(),
        }
    }
}

/// When to suppress fetching for labels that already have an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Never suppress; new matches are fetched next to existing artifacts.
    Allow,
    /// Always suppress once a label has any artifact.
    Suppress,
    /// Suppress only when the playlist was first filled from another system.
    #[default]
    OnSourceChange,
}

impl MergePolicy {
    /// Resolve the policy for one run.
    pub fn suppresses(&self, source_changed: bool) -> bool {
        match self {
            MergePolicy::Allow => false,
            MergePolicy::Suppress => true,
            MergePolicy::OnSourceChange => source_changed,
        }
    }
}

/// The configuration value consumed by the matching pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub normalize: NormalizeConfig,
    /// Minimum score in `0..=100`; `100` means exact match only.
    pub min_score: u8,
    /// Maximum number of chosen entries per label (ties at the boundary are kept).
    pub limit: usize,
    /// Zero the score of candidates sharing almost no prefix with the label.
    pub prefix_guard: bool,
    pub merge: MergePolicy,
    /// Glob patterns over raw label text that force a reset.
    pub reset_patterns: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            min_score: ScoreConfig::DEFAULT_MIN,
            limit: ScoreConfig::DEFAULT_LIMIT,
            prefix_guard: false,
            merge: MergePolicy::default(),
            reset_patterns: Vec::new(),
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_reset_patterns(mut self, patterns: Vec<String>) -> Self {
        self.reset_patterns = patterns;
        self
    }

    pub fn with_prefix_guard(mut self, prefix_guard: bool) -> Self {
        self.prefix_guard = prefix_guard;
        self
    }

    /// Whether only identical normalized strings may match.
    pub fn exact_only(&self) -> bool {
        self.min_score >= ScoreConfig::MAX
    }

    /// Reject values and toggle combinations that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.min_score > ScoreConfig::MAX {
            return Err(RetrofuzzError::config(format!(
                "min_score {} is above the maximum {}",
                self.min_score,
                ScoreConfig::MAX
            )));
        }
        if self.limit == 0 {
            return Err(RetrofuzzError::config("limit must be at least 1"));
        }
        if self.normalize.capitalize_words && !self.normalize.remove_spaces {
            return Err(RetrofuzzError::config(
                "capitalize_words requires remove_spaces",
            ));
        }
        if matches!(self.normalize.before.as_deref(), Some("")) {
            return Err(RetrofuzzError::config("the before marker must not be empty"));
        }
        LabelFilter::new(&self.reset_patterns)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_min_score() {
        assert_eq!(parse_min_score("exact").unwrap(), 100);
        assert_eq!(parse_min_score("EXACT").unwrap(), 100);
        assert_eq!(parse_min_score(" 85 ").unwrap(), 85);
        assert_eq!(parse_min_score("0").unwrap(), 0);
        assert!(parse_min_score("101").is_err());
        assert!(parse_min_score("high").is_err());
        assert!(parse_min_score("-1").is_err());
    }

    #[test]
    fn test_merge_policy_resolution() {
        assert!(!MergePolicy::Allow.suppresses(true));
        assert!(MergePolicy::Suppress.suppresses(false));
        assert!(MergePolicy::OnSourceChange.suppresses(true));
        assert!(!MergePolicy::OnSourceChange.suppresses(false));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.exact_only());
        assert!(config.clone().with_min_score(100).exact_only());
    }

    #[test]
    fn test_validate_rejects_conflicts() {
        assert!(MatchConfig::new().with_limit(0).validate().is_err());

        let mut config = MatchConfig::new();
        config.normalize.capitalize_words = true;
        assert!(config.validate().is_err());
        config.normalize.remove_spaces = true;
        assert!(config.validate().is_ok());

        let mut config = MatchConfig::new();
        config.normalize.before = Some(String::new());
        assert!(config.validate().is_err());

        let config = MatchConfig::new().with_reset_patterns(vec!["Doom[".into()]);
        assert!(matches!(
            config.validate(),
            Err(RetrofuzzError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: MatchConfig = serde_json::from_str(
            r#"{"min_score": 95, "normalize": {"strip_subtitle": true}, "merge": "allow"}"#,
        )
        .unwrap();
        assert_eq!(config.min_score, 95);
        assert_eq!(config.limit, ScoreConfig::DEFAULT_LIMIT);
        assert!(config.normalize.strip_subtitle);
        assert!(!config.normalize.keep_square);
        assert_eq!(config.merge, MergePolicy::Allow);
        assert_eq!(config.normalize.substitutions, SubstitutionTable::default());
    }
}
