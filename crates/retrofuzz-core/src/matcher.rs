//! Fuzzy scoring of a normalized label against remote candidates.
//!
//! The score is a token-set ratio: both strings are split into word sets, and
//! the shared words are compared against each side's full word set with a
//! normalized Levenshtein ratio. Word order does not matter and a label whose
//! words are a subset of the candidate's scores 100.

use crate::config::{NormalizeConfig, ScoreConfig};
use crate::model::RemoteEntry;
use crate::normalize::normalize;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Longest common prefix, in characters, that still trips the prefix guard.
const PREFIX_GUARD_CHARS: usize = 2;

/// A remote entry with its normalized name precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub entry: RemoteEntry,
    pub normalized: String,
}

/// Normalize every remote entry once, preserving catalog order.
pub fn prepare_candidates(entries: Vec<RemoteEntry>, config: &NormalizeConfig) -> Vec<Candidate> {
    entries
        .into_par_iter()
        .map(|entry| {
            let normalized = normalize(&entry.name, config);
            Candidate { entry, normalized }
        })
        .collect()
}

/// Score of one candidate for one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub entry: &'a RemoteEntry,
    pub score: u8,
    /// Normalized label text.
    pub source: &'a str,
    /// Normalized candidate text.
    pub candidate: &'a str,
}

/// Score `source` against every candidate, in candidate order.
pub fn match_candidates<'a>(
    source: &'a str,
    candidates: &'a [Candidate],
    prefix_guard: bool,
) -> Vec<MatchResult<'a>> {
    candidates
        .iter()
        .map(|candidate| MatchResult {
            entry: &candidate.entry,
            score: score(source, &candidate.normalized, prefix_guard),
            source,
            candidate: &candidate.normalized,
        })
        .collect()
}

/// Score two normalized strings in `0..=100`.
pub fn score(source: &str, candidate: &str, prefix_guard: bool) -> u8 {
    if source.is_empty() || candidate.is_empty() {
        return 0;
    }
    if source == candidate {
        return ScoreConfig::MAX;
    }
    if prefix_guard && fails_prefix_guard(source, candidate) {
        return 0;
    }
    token_set_ratio(source, candidate)
}

/// The first result with the highest score.
pub fn best_match<'a, 'r>(results: &'r [MatchResult<'a>]) -> Option<&'r MatchResult<'a>> {
    results.iter().fold(None, |best, result| match best {
        Some(current) if current.score >= result.score => Some(current),
        _ => Some(result),
    })
}

fn fails_prefix_guard(source: &str, candidate: &str) -> bool {
    let common = source
        .chars()
        .zip(candidate.chars())
        .take_while(|(a, b)| a == b)
        .count();
    common <= PREFIX_GUARD_CHARS && source.chars().count() != candidate.chars().count()
}

fn token_set_ratio(source: &str, candidate: &str) -> u8 {
    let left: BTreeSet<&str> = source.split_whitespace().collect();
    let right: BTreeSet<&str> = candidate.split_whitespace().collect();

    let shared = join(left.intersection(&right));
    let left_full = join_after(&shared, left.difference(&right));
    let right_full = join_after(&shared, right.difference(&left));

    let best = [
        ratio(&shared, &left_full),
        ratio(&shared, &right_full),
        ratio(&left_full, &right_full),
    ]
    .into_iter()
    .fold(0.0_f64, f64::max);

    (best * f64::from(ScoreConfig::MAX)).round() as u8
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn join_after<'a, 'b: 'a>(prefix: &str, rest: impl Iterator<Item = &'a &'b str>) -> String {
    let rest = join(rest);
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest,
        (false, true) => prefix.to_string(),
        (false, false) => format!("{} {}", prefix, rest),
    }
}
