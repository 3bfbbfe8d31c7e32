//! Threshold, tie handling and result limit.

use crate::config::ScoreConfig;
use crate::matcher::MatchResult;

/// Pick the results worth fetching.
///
/// Results below `min_score` are dropped; at `min_score == 100` the
/// normalized strings must also be identical. The rest are stably sorted by
/// descending score and cut after `limit`, keeping every result tied with the
/// last one kept.
pub fn select<'a>(results: Vec<MatchResult<'a>>, min_score: u8, limit: usize) -> Vec<MatchResult<'a>> {
    let exact_only = min_score >= ScoreConfig::MAX;
    let mut passing: Vec<MatchResult<'a>> = results
        .into_iter()
        .filter(|r| r.score >= min_score && (!exact_only || r.source == r.candidate))
        .collect();

    passing.sort_by(|a, b| b.score.cmp(&a.score));

    if limit == 0 {
        return Vec::new();
    }
    if passing.len() > limit {
        let boundary = passing[limit - 1].score;
        let ties = passing[limit..]
            .iter()
            .take_while(|r| r.score == boundary)
            .count();
        passing.truncate(limit + ties);
    }
    passing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizeConfig;
    use crate::matcher::{match_candidates, prepare_candidates, Candidate};
    use crate::model::RemoteEntry;
    use crate::normalize::normalize;

    fn entries(n: usize) -> Vec<RemoteEntry> {
        (0..n).map(|i| RemoteEntry::new(format!("e{i}"), "X")).collect()
    }

    fn results<'a>(pool: &'a [RemoteEntry], scores: &[u8]) -> Vec<MatchResult<'a>> {
        pool.iter()
            .zip(scores)
            .map(|(entry, &score)| MatchResult {
                entry,
                score,
                source: "s",
                candidate: "c",
            })
            .collect()
    }

    fn names(selected: &[MatchResult<'_>]) -> Vec<String> {
        selected.iter().map(|r| r.entry.name.clone()).collect()
    }

    #[test]
    fn test_threshold_and_sort() {
        let pool = entries(4);
        let selected = select(results(&pool, &[50, 95, 91, 89]), 90, 5);
        assert_eq!(names(&selected), ["e1", "e2"]);
    }

    #[test]
    fn test_limit_keeps_boundary_ties() {
        let pool = entries(5);
        let selected = select(results(&pool, &[92, 97, 92, 92, 80]), 0, 2);
        assert_eq!(names(&selected), ["e1", "e0", "e2", "e3"]);
    }

    #[test]
    fn test_limit_without_ties() {
        let pool = entries(3);
        let selected = select(results(&pool, &[70, 80, 90]), 0, 1);
        assert_eq!(names(&selected), ["e2"]);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let pool = entries(6);
        let scores = [10, 55, 90, 90, 100, 73];
        let mut previous = usize::MAX;
        for min in [0, 10, 50, 73, 90, 99] {
            let count = select(results(&pool, &scores), min, usize::MAX).len();
            assert!(count <= previous, "min {min}");
            previous = count;
        }
    }

    #[test]
    fn test_empty_output_is_normal() {
        let pool = entries(2);
        assert!(select(results(&pool, &[10, 20]), 90, 1).is_empty());
        assert!(select(Vec::new(), 0, 1).is_empty());
    }

    fn pool(names: &[&str]) -> Vec<Candidate> {
        prepare_candidates(
            names.iter().map(|n| RemoteEntry::new(*n, "Commodore - Amiga")).collect(),
            &NormalizeConfig::default(),
        )
    }

    #[test]
    fn test_exact_only_requires_identical_strings() {
        let config = NormalizeConfig::default();
        let candidates = pool(&["Ishar"]);

        let label = normalize("ishar", &config);
        let selected = select(match_candidates(&label, &candidates, false), 100, 1);
        assert_eq!(selected.len(), 1);

        let label = normalize("Ishar II", &config);
        let all = match_candidates(&label, &candidates, false);
        assert_eq!(all[0].score, 100);
        assert!(select(all, 100, 1).is_empty());
    }
}
