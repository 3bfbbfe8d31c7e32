//! Shell-style glob filters over raw label text.
//!
//! Patterns are matched against the label text itself, not a path, so `*`
//! also crosses `/` characters.

use crate::{Result, RetrofuzzError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled set of glob patterns.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl LabelFilter {
    /// Compile a filter. An empty pattern list matches nothing.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .build()
                .map_err(|e| RetrofuzzError::InvalidGlob {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| RetrofuzzError::InvalidGlob {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// A filter without patterns.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether any pattern matches the raw label text.
    pub fn matches(&self, text: &str) -> bool {
        self.set.is_match(text)
    }
}

impl Default for LabelFilter {
    fn default() -> Self {
        Self::empty()
    }
}
