//! Label normalization.
//!
//! Text is parsed into plain-text segments and bracket groups, then run
//! through [`PIPELINE`], an ordered list of named steps. Every step is a pure
//! function of its input segments and the [`NormalizeConfig`], so the
//! normalized form of a name is always recomputed, never stored.

pub mod segments;
mod table;

pub use segments::{Bracket, Segment};
pub use table::SubstitutionTable;

use crate::config::NormalizeConfig;
use std::fmt;

/// Subtitle separators, as they appear in labels and on the thumbnail server.
const SUBTITLE_SEPARATORS: [&str; 3] = [" - ", ": ", "_ "];

/// A named normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep or drop `(...)` and `[...]` groups.
    Brackets,
    /// Cut at the first `before` marker outside brackets.
    Truncate,
    /// Drop the trailing subtitle.
    Subtitle,
    /// Case fold, substitutions and whitespace handling.
    Canonicalize,
}

/// The steps in the order they run.
pub const PIPELINE: [Step; 4] = [
    Step::Brackets,
    Step::Truncate,
    Step::Subtitle,
    Step::Canonicalize,
];

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Brackets => "brackets",
            Step::Truncate => "truncate",
            Step::Subtitle => "subtitle",
            Step::Canonicalize => "canonicalize",
        }
    }

    fn apply(
        &self,
        segments: Vec<Segment>,
        config: &NormalizeConfig,
        notes: &mut Vec<NormalizeNote>,
    ) -> Vec<Segment> {
        match self {
            Step::Brackets => strip_groups(segments, config),
            Step::Truncate => match config.before.as_deref() {
                Some(marker) if !marker.is_empty() => truncate(segments, marker, notes),
                _ => segments,
            },
            Step::Subtitle if config.strip_subtitle => strip_subtitle(segments),
            Step::Subtitle => segments,
            Step::Canonicalize => vec![Segment::Text(canonicalize(
                &segments::render(&segments),
                config,
            ))],
        }
    }
}

/// A non-fatal configuration problem observed while normalizing one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeNote {
    /// The truncation marker only occurs inside bracket groups and was ignored.
    MarkerOnlyInsideBrackets { marker: String },
}

impl fmt::Display for NormalizeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeNote::MarkerOnlyInsideBrackets { marker } => {
                write!(f, "marker {:?} only occurs inside brackets; ignored", marker)
            }
        }
    }
}

/// Normalized text plus the notes raised while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub notes: Vec<NormalizeNote>,
}

/// Normalize a label or remote name into its comparison form.
pub fn normalize(text: &str, config: &NormalizeConfig) -> String {
    normalize_with_notes(text, config).text
}

/// Normalize and report the notes raised for this text.
pub fn normalize_with_notes(text: &str, config: &NormalizeConfig) -> Normalized {
    let mut notes = Vec::new();
    let mut current = segments::parse(text);
    for step in PIPELINE {
        current = step.apply(current, config, &mut notes);
    }
    Normalized {
        text: segments::render(&current),
        notes,
    }
}

fn strip_groups(segments: Vec<Segment>, config: &NormalizeConfig) -> Vec<Segment> {
    let kept = segments.into_iter().filter(|segment| match segment {
        Segment::Text(_) => true,
        Segment::Group {
            bracket: Bracket::Round,
            ..
        } => !config.strip_round,
        Segment::Group {
            bracket: Bracket::Square,
            ..
        } => config.keep_square,
    });
    segments::coalesce(kept.collect())
}

fn truncate(segments: Vec<Segment>, marker: &str, notes: &mut Vec<NormalizeNote>) -> Vec<Segment> {
    let cut = segments.iter().enumerate().find_map(|(index, segment)| {
        segment
            .as_text()
            .and_then(|text| text.find(marker))
            .map(|offset| (index, offset))
    });

    match cut {
        Some((index, offset)) => {
            let mut kept: Vec<Segment> = segments.into_iter().take(index + 1).collect();
            if let Some(Segment::Text(text)) = kept.last_mut() {
                text.truncate(offset);
            }
            kept
        }
        None => {
            let inside = segments.iter().any(|segment| {
                matches!(segment, Segment::Group { inner, .. } if inner.contains(marker))
            });
            if inside {
                notes.push(NormalizeNote::MarkerOnlyInsideBrackets {
                    marker: marker.to_string(),
                });
            }
            segments
        }
    }
}

fn strip_subtitle(mut segments: Vec<Segment>) -> Vec<Segment> {
    for segment in segments.iter_mut().rev() {
        if let Segment::Text(text) = segment {
            let last = SUBTITLE_SEPARATORS
                .iter()
                .filter_map(|separator| text.rfind(separator))
                .max();
            if let Some(position) = last {
                text.truncate(position);
                text.push(' ');
                break;
            }
        }
    }
    segments
}

fn canonicalize(text: &str, config: &NormalizeConfig) -> String {
    let table = &config.substitutions;
    let tokens = table.tokens(&table.fold(text));

    if !config.remove_spaces {
        return tokens.join(" ");
    }

    let mut out = String::new();
    for (index, token) in tokens.iter().enumerate() {
        if index > 0 && config.capitalize_words {
            let mut chars = token.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(token);
        }
    }
    out
}
