//! Cache reconciliation: what to keep, fetch and delete for one label.

use crate::config::MergePolicy;
use crate::filter::LabelFilter;
use crate::model::{CacheEntry, Decision, KeepReason, Label, RemoteEntry, SkipReason};

/// Decide the actions for one label.
///
/// Identity between a chosen entry and a cached artifact is the pair
/// (remote name, remote category). Decisions come out as deletes first, then
/// one decision per chosen entry in selection order, then a skip when nothing
/// was chosen. `best_score` is only used to describe that skip.
///
/// Without a reset, untracked files at the label's own stem satisfy the label
/// unless `merge` is [`MergePolicy::Allow`].
pub fn reconcile(
    label: &Label,
    chosen: &[&RemoteEntry],
    cached: &[CacheEntry],
    resets: &LabelFilter,
    merge: MergePolicy,
    source_changed: bool,
    best_score: Option<u8>,
) -> Vec<Decision> {
    let mut decisions = Vec::new();
    let reset = resets.matches(&label.text);

    if reset {
        decisions.extend(
            cached
                .iter()
                .filter(|entry| !chosen.iter().any(|remote| remote.is_cached_as(entry)))
                .cloned()
                .map(Decision::Delete),
        );
    }

    let suppressed = !reset && merge.suppresses(source_changed) && !cached.is_empty();
    let untracked = !reset
        && merge != MergePolicy::Allow
        && cached.iter().any(CacheEntry::is_untracked);
    for remote in chosen {
        let decision = if cached.iter().any(|entry| remote.is_cached_as(entry)) {
            Decision::Keep {
                remote: remote.name.clone(),
                reason: KeepReason::Cached,
            }
        } else if suppressed {
            Decision::Keep {
                remote: remote.name.clone(),
                reason: KeepReason::MergeSuppressed,
            }
        } else if untracked {
            Decision::Keep {
                remote: remote.name.clone(),
                reason: KeepReason::Untracked,
            }
        } else {
            Decision::Fetch((*remote).clone())
        };
        decisions.push(decision);
    }

    if chosen.is_empty() {
        decisions.push(Decision::Skip(SkipReason::NoMatch { best_score }));
    }

    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThumbnailKind;

    const SYSTEM: &str = "Commodore - Amiga";

    fn label(text: &str) -> Label {
        Label::new(text, SYSTEM)
    }

    fn cached(label: &str, remote: &str) -> CacheEntry {
        CacheEntry {
            label: label.to_string(),
            remote: Some(remote.to_string()),
            category: Some(SYSTEM.to_string()),
            stem: label.to_string(),
            kinds: vec![ThumbnailKind::Boxart],
        }
    }

    fn untracked(label: &str) -> CacheEntry {
        CacheEntry {
            label: label.to_string(),
            remote: None,
            category: None,
            stem: label.to_string(),
            kinds: vec![ThumbnailKind::Snap],
        }
    }

    fn resets(patterns: &[&str]) -> LabelFilter {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        LabelFilter::new(&patterns).unwrap()
    }

    #[test]
    fn test_fetch_when_nothing_cached() {
        let new = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let decisions = reconcile(&label("Ishar"), &[&new], &[], &LabelFilter::empty(), MergePolicy::Suppress, false, Some(100));
        assert_eq!(decisions, vec![Decision::Fetch(new)]);
    }

    #[test]
    fn test_already_cached_is_kept() {
        let entry = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[&entry], &cache, &LabelFilter::empty(), MergePolicy::Allow, false, Some(100));
        assert_eq!(
            decisions,
            vec![Decision::Keep {
                remote: "Ishar (Europe)".into(),
                reason: KeepReason::Cached
            }]
        );
    }

    #[test]
    fn test_merge_suppression_blocks_fetch() {
        let new = RemoteEntry::new("Ishar (USA)", SYSTEM);
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), MergePolicy::Suppress, false, Some(95));
        assert!(!decisions.iter().any(Decision::is_fetch));
        assert_eq!(
            decisions,
            vec![Decision::Keep {
                remote: "Ishar (USA)".into(),
                reason: KeepReason::MergeSuppressed
            }]
        );
    }

    #[test]
    fn test_merge_allowed_fetches_next_to_existing() {
        let new = RemoteEntry::new("Ishar (USA)", SYSTEM);
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), MergePolicy::Allow, false, Some(95));
        assert_eq!(decisions, vec![Decision::Fetch(new)]);
    }

    #[test]
    fn test_reset_overrides_merge_suppression() {
        let new = RemoteEntry::new("Ishar (USA)", SYSTEM);
        let stale = cached("Ishar", "Ishar (Europe)");
        let decisions = reconcile(
            &label("Ishar"),
            &[&new],
            &[stale.clone()],
            &resets(&["Ishar*"]),
            MergePolicy::Suppress,
            false,
            Some(95),
        );
        assert_eq!(decisions, vec![Decision::Delete(stale), Decision::Fetch(new)]);
    }

    #[test]
    fn test_reset_keeps_chosen_cached_entry() {
        let keep = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let cache = vec![cached("Ishar", "Ishar (Europe)"), cached("Ishar", "Ishar 2 (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[&keep], &cache, &resets(&["*"]), MergePolicy::Allow, false, Some(100));
        assert_eq!(
            decisions,
            vec![
                Decision::Delete(cache[1].clone()),
                Decision::Keep {
                    remote: "Ishar (Europe)".into(),
                    reason: KeepReason::Cached
                },
            ]
        );
    }

    #[test]
    fn test_reset_without_match_deletes_then_skips() {
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[], &cache, &resets(&["Ishar"]), MergePolicy::Allow, false, Some(40));
        assert_eq!(
            decisions,
            vec![
                Decision::Delete(cache[0].clone()),
                Decision::Skip(SkipReason::NoMatch {
                    best_score: Some(40)
                }),
            ]
        );
    }

    #[test]
    fn test_reset_deletes_untracked_files() {
        let untracked = untracked("Ishar");
        let new = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let decisions = reconcile(&label("Ishar"), &[&new], &[untracked.clone()], &resets(&["Ishar"]), MergePolicy::Allow, false, Some(100));
        assert_eq!(decisions, vec![Decision::Delete(untracked), Decision::Fetch(new)]);
    }

    #[test]
    fn test_unmatched_cached_entries_left_alone_without_reset() {
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[], &cache, &resets(&["Doom*"]), MergePolicy::Allow, false, None);
        assert_eq!(
            decisions,
            vec![Decision::Skip(SkipReason::NoMatch { best_score: None })]
        );
    }

    #[test]
    fn test_same_name_other_category_is_not_cached() {
        let entry = RemoteEntry::new("Ishar (Europe)", "Atari - ST");
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let decisions = reconcile(&label("Ishar"), &[&entry], &cache, &LabelFilter::empty(), MergePolicy::Allow, false, Some(100));
        assert_eq!(decisions, vec![Decision::Fetch(entry)]);
    }

    #[test]
    fn test_untracked_files_satisfy_label_by_default() {
        let new = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let cache = vec![untracked("Ishar")];
        for merge in [MergePolicy::OnSourceChange, MergePolicy::Suppress] {
            let decisions = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), merge, false, Some(100));
            assert_eq!(
                decisions,
                vec![Decision::Keep {
                    remote: "Ishar (Europe)".into(),
                    reason: if merge == MergePolicy::Suppress {
                        KeepReason::MergeSuppressed
                    } else {
                        KeepReason::Untracked
                    },
                }]
            );
        }
    }

    #[test]
    fn test_untracked_files_merged_only_when_allowed() {
        let new = RemoteEntry::new("Ishar (Europe)", SYSTEM);
        let cache = vec![untracked("Ishar")];
        let decisions = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), MergePolicy::Allow, false, Some(100));
        assert_eq!(decisions, vec![Decision::Fetch(new)]);
    }

    #[test]
    fn test_source_change_resolves_merge_policy() {
        let new = RemoteEntry::new("Ishar (USA)", SYSTEM);
        let cache = vec![cached("Ishar", "Ishar (Europe)")];
        let policy = MergePolicy::OnSourceChange;

        let same_source = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), policy, false, Some(95));
        assert_eq!(same_source, vec![Decision::Fetch(new.clone())]);

        let changed = reconcile(&label("Ishar"), &[&new], &cache, &LabelFilter::empty(), policy, true, Some(95));
        assert_eq!(
            changed,
            vec![Decision::Keep {
                remote: "Ishar (USA)".into(),
                reason: KeepReason::MergeSuppressed
            }]
        );
    }
}
