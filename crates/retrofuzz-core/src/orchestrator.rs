//! Per-label matching pipeline and batch execution.
//!
//! Planning is pure: each in-scope label is normalized, scored against every
//! candidate, narrowed by the selector and reconciled against a snapshot of
//! its cached artifacts. Labels are planned in parallel. Execution then hands
//! the decisions to a [`DecisionExecutor`] one label at a time, in playlist
//! order, stopping cleanly when the cancellation token fires.

use crate::cancel::CancellationToken;
use crate::config::MatchConfig;
use crate::filter::LabelFilter;
use crate::matcher::{best_match, match_candidates, prepare_candidates, Candidate};
use crate::model::{CacheEntry, Decision, Label, RemoteEntry};
use crate::normalize::{normalize_with_notes, NormalizeNote};
use crate::reconcile::reconcile;
use crate::selector::select;
use crate::traits::{CacheInspector, DecisionExecutor};
use crate::{Result, RetrofuzzError};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Highest-scoring candidate of a label, whether or not it passed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMatch {
    pub remote: String,
    pub score: u8,
    /// Normalized candidate text.
    pub candidate: String,
}

/// A selected remote entry and its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChosenMatch {
    pub entry: RemoteEntry,
    pub score: u8,
}

/// Everything decided for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPlan {
    pub label: Label,
    pub normalized: String,
    #[serde(skip)]
    pub notes: Vec<NormalizeNote>,
    pub best: Option<BestMatch>,
    pub chosen: Vec<ChosenMatch>,
    /// More entries were chosen than the limit because of a tie.
    pub tied: bool,
    /// A reset pattern matched the label.
    pub reset: bool,
    pub decisions: Vec<Decision>,
}

/// Plan for a whole playlist.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub category: String,
    pub labels: Vec<LabelPlan>,
    pub out_of_scope: Vec<Label>,
}

/// Drives normalization, matching, selection and reconciliation.
pub struct Orchestrator {
    config: MatchConfig,
    category: String,
    candidates: Vec<Candidate>,
    scope: LabelFilter,
    resets: LabelFilter,
    source_changed: bool,
}

impl Orchestrator {
    /// Validate the configuration and prepare the catalog of `category`.
    pub fn new(config: MatchConfig, category: impl Into<String>, entries: Vec<RemoteEntry>) -> Result<Self> {
        config.validate()?;
        let resets = LabelFilter::new(&config.reset_patterns)?;
        let candidates = prepare_candidates(entries, &config.normalize);
        let category = category.into();
        debug!(
            "Prepared {} candidates for {}",
            candidates.len(),
            category
        );

        Ok(Self {
            config,
            category,
            candidates,
            scope: LabelFilter::empty(),
            resets,
            source_changed: false,
        })
    }

    /// Only process labels matching one of `patterns`. Empty means all.
    pub fn with_scope(mut self, patterns: &[String]) -> Result<Self> {
        self.scope = LabelFilter::new(patterns)?;
        Ok(self)
    }

    /// Whether the cache was first filled from another category than this
    /// one. Resolves [`MergePolicy::OnSourceChange`](crate::config::MergePolicy).
    pub fn with_source_changed(mut self, source_changed: bool) -> Self {
        self.source_changed = source_changed;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn in_scope(&self, label: &Label) -> bool {
        self.scope.is_empty() || self.scope.matches(&label.text)
    }

    /// Plan one label against its cached artifacts.
    pub fn plan_label(&self, label: &Label, cached: &[CacheEntry]) -> LabelPlan {
        let normalized = normalize_with_notes(&label.text, &self.config.normalize);
        for note in &normalized.notes {
            warn!("{}: {}", label.text, note);
        }

        let results = match_candidates(&normalized.text, &self.candidates, self.config.prefix_guard);
        let best = best_match(&results).map(|r| BestMatch {
            remote: r.entry.name.clone(),
            score: r.score,
            candidate: r.candidate.to_string(),
        });

        let selected = select(results, self.config.min_score, self.config.limit);
        let tied = selected.len() > self.config.limit;
        let chosen_refs: Vec<&RemoteEntry> = selected.iter().map(|r| r.entry).collect();
        let decisions = reconcile(
            label,
            &chosen_refs,
            cached,
            &self.resets,
            self.config.merge,
            self.source_changed,
            best.as_ref().map(|b| b.score),
        );

        let chosen = selected
            .iter()
            .map(|r| ChosenMatch {
                entry: r.entry.clone(),
                score: r.score,
            })
            .collect();

        debug!(
            "{} -> {:?} (best {:?})",
            label.text,
            normalized.text,
            best.as_ref().map(|b| (&b.remote, b.score))
        );

        LabelPlan {
            label: label.clone(),
            reset: self.resets.matches(&label.text),
            normalized: normalized.text,
            notes: normalized.notes,
            best,
            chosen,
            tied,
            decisions,
        }
    }

    /// Plan every label of a playlist.
    ///
    /// Cache inspection runs first, sequentially, so a failing collaborator
    /// aborts the plan before any matching work is done.
    pub fn plan<C>(&self, labels: &[Label], cache: &C) -> Result<Plan>
    where
        C: CacheInspector + ?Sized,
    {
        let (in_scope, out_of_scope): (Vec<&Label>, Vec<&Label>) =
            labels.iter().partition(|label| self.in_scope(label));

        let snapshots = in_scope
            .iter()
            .map(|label| cache.cached_entries(label))
            .collect::<Result<Vec<_>>>()?;

        let planned: Vec<LabelPlan> = in_scope
            .par_iter()
            .zip(snapshots.par_iter())
            .map(|(label, cached)| self.plan_label(label, cached))
            .collect();

        Ok(Plan {
            category: self.category.clone(),
            labels: planned,
            out_of_scope: out_of_scope.into_iter().cloned().collect(),
        })
    }

    /// Plan and execute in one go.
    pub async fn run<C, E>(
        &self,
        labels: &[Label],
        cache: &C,
        executor: &E,
        cancel: &CancellationToken,
    ) -> Result<RunReport>
    where
        C: CacheInspector + ?Sized,
        E: DecisionExecutor + ?Sized,
    {
        let plan = self.plan(labels, cache)?;
        Ok(plan.execute(executor, cancel).await)
    }
}

/// Result of applying one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "error")]
pub enum Status {
    Applied,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub decision: Decision,
    pub status: Status,
}

/// Per-label diagnostic detail of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelReport {
    pub plan: LabelPlan,
    pub outcomes: Vec<DecisionOutcome>,
}

impl LabelReport {
    /// Whether at least one fetch succeeded or an existing artifact was kept.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().any(|o| {
            o.status == Status::Applied
                && matches!(o.decision, Decision::Fetch(_) | Decision::Keep { .. })
        })
    }

    pub fn failed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, Status::Failed(_)))
    }
}

/// Aggregate counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub kept: usize,
    pub deleted: usize,
    /// Labels without a match above the threshold.
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub out_of_scope: usize,
    /// Labels whose selection was widened by a tie.
    pub tied: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} kept, {} deleted, {} without match, {} failed",
            self.fetched, self.kept, self.deleted, self.skipped, self.failed
        )?;
        if self.out_of_scope > 0 {
            write!(f, ", {} out of scope", self.out_of_scope)?;
        }
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub category: String,
    pub labels: Vec<LabelReport>,
    pub out_of_scope: Vec<Label>,
    pub summary: RunSummary,
}

impl Plan {
    /// Hand every decision to `executor`, label by label.
    ///
    /// Failures are recorded per decision and never abort the batch. Once
    /// `cancel` fires, the remaining decisions are marked cancelled.
    pub async fn execute<E>(self, executor: &E, cancel: &CancellationToken) -> RunReport
    where
        E: DecisionExecutor + ?Sized,
    {
        let mut summary = RunSummary {
            out_of_scope: self.out_of_scope.len(),
            ..RunSummary::default()
        };
        let mut reports = Vec::with_capacity(self.labels.len());

        for plan in self.labels {
            if plan.tied {
                summary.tied += 1;
            }

            let mut outcomes = Vec::with_capacity(plan.decisions.len());
            for decision in &plan.decisions {
                let status = if cancel.is_cancelled() {
                    Status::Cancelled
                } else {
                    apply(executor, &plan.label, decision).await
                };

                match (&status, decision) {
                    (Status::Cancelled, _) => summary.cancelled += 1,
                    (Status::Failed(_), _) => summary.failed += 1,
                    (Status::Applied, Decision::Fetch(_)) => summary.fetched += 1,
                    (Status::Applied, Decision::Delete(_)) => summary.deleted += 1,
                    (Status::Applied, Decision::Keep { .. }) => summary.kept += 1,
                    (Status::Applied, Decision::Skip(_)) => summary.skipped += 1,
                }

                outcomes.push(DecisionOutcome {
                    decision: decision.clone(),
                    status,
                });
            }

            reports.push(LabelReport { plan, outcomes });
        }

        info!("{}: {}", self.category, summary);

        RunReport {
            category: self.category,
            labels: reports,
            out_of_scope: self.out_of_scope,
            summary,
        }
    }
}

async fn apply<E>(executor: &E, label: &Label, decision: &Decision) -> Status
where
    E: DecisionExecutor + ?Sized,
{
    if matches!(decision, Decision::Keep { .. } | Decision::Skip(_)) {
        return Status::Applied;
    }
    match executor.apply(label, decision).await {
        Ok(()) => Status::Applied,
        Err(RetrofuzzError::Cancelled) => Status::Cancelled,
        Err(e) => {
            warn!("{}: {} failed: {}", label.text, decision, e);
            Status::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergePolicy;
    use crate::model::{KeepReason, SkipReason, ThumbnailKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SYSTEM: &str = "Commodore - Amiga";

    #[derive(Default)]
    struct FakeCache {
        entries: HashMap<String, Vec<CacheEntry>>,
        fail: bool,
    }

    impl FakeCache {
        fn with(mut self, label: &str, remote: &str) -> Self {
            self.entries.entry(label.to_string()).or_default().push(CacheEntry {
                label: label.to_string(),
                remote: Some(remote.to_string()),
                category: Some(SYSTEM.to_string()),
                stem: label.to_string(),
                kinds: vec![ThumbnailKind::Boxart],
            });
            self
        }
    }

    impl CacheInspector for FakeCache {
        fn cached_entries(&self, label: &Label) -> Result<Vec<CacheEntry>> {
            if self.fail {
                return Err(RetrofuzzError::Other("cache unavailable".into()));
            }
            Ok(self.entries.get(&label.text).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        applied: Mutex<Vec<(String, Decision)>>,
        fail_on: Option<String>,
        cancel_after_first: Option<CancellationToken>,
    }

    #[async_trait]
    impl DecisionExecutor for RecordingExecutor {
        async fn apply(&self, label: &Label, decision: &Decision) -> Result<()> {
            if self.fail_on.as_deref() == Some(label.text.as_str()) {
                return Err(RetrofuzzError::NotFound {
                    url: "https://example.invalid/x.png".into(),
                });
            }
            self.applied
                .lock()
                .unwrap()
                .push((label.text.clone(), decision.clone()));
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            Ok(())
        }
    }

    fn catalog() -> Vec<RemoteEntry> {
        [
            "Ishar (Europe)",
            "Lotus Turbo Challenge (Europe)",
            "Zool (Europe)",
            "Monkey Island 2 (Europe)",
        ]
            .iter()
            .map(|n| RemoteEntry::new(*n, SYSTEM).with_kinds([ThumbnailKind::Boxart]))
            .collect()
    }

    fn labels(texts: &[&str]) -> Vec<Label> {
        texts.iter().map(|t| Label::new(*t, "Amiga")).collect()
    }

    fn config() -> MatchConfig {
        let mut config = MatchConfig::new().with_min_score(90);
        config.normalize.strip_round = true;
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Orchestrator::new(MatchConfig::new().with_limit(0), SYSTEM, catalog()).is_err());
    }

    #[test]
    fn test_plan_label_details() {
        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog()).unwrap();
        let plan = orchestrator.plan_label(&Label::new("Zool [cr]", "Amiga"), &[]);
        assert_eq!(plan.normalized, "zool");
        assert_eq!(plan.best.as_ref().unwrap().remote, "Zool (Europe)");
        assert_eq!(plan.chosen.len(), 1);
        assert!(!plan.tied);
        assert_eq!(
            plan.decisions,
            vec![Decision::Fetch(catalog()[2].clone())]
        );
    }

    #[test]
    fn test_plan_marks_ties() {
        let entries = vec![
            RemoteEntry::new("Zool (Europe)", SYSTEM),
            RemoteEntry::new("Zool (USA)", SYSTEM),
        ];
        let orchestrator = Orchestrator::new(config(), SYSTEM, entries).unwrap();
        let plan = orchestrator.plan_label(&Label::new("Zool", "Amiga"), &[]);
        assert!(plan.tied);
        assert_eq!(plan.decisions.iter().filter(|d| d.is_fetch()).count(), 2);
    }

    #[test]
    fn test_plan_respects_scope_and_order() {
        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog())
            .unwrap()
            .with_scope(&["Ishar*".to_string(), "Zool".to_string()])
            .unwrap();
        let plan = orchestrator
            .plan(&labels(&["Zool", "Monkey Island 2", "Ishar", "Ishar 2"]), &FakeCache::default())
            .unwrap();
        let planned: Vec<&str> = plan.labels.iter().map(|p| p.label.text.as_str()).collect();
        assert_eq!(planned, ["Zool", "Ishar", "Ishar 2"]);
        assert_eq!(plan.out_of_scope.len(), 1);
    }

    #[test]
    fn test_plan_propagates_cache_failure() {
        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog()).unwrap();
        let cache = FakeCache {
            fail: true,
            ..FakeCache::default()
        };
        assert!(orchestrator.plan(&labels(&["Zool"]), &cache).is_err());
    }

    #[test]
    fn test_plan_applies_configured_merge_policy() {
        let cache = FakeCache::default().with("Zool", "Zool (USA)");
        let suppressed = vec![Decision::Keep {
            remote: "Zool (Europe)".into(),
            reason: KeepReason::MergeSuppressed,
        }];

        let orchestrator = Orchestrator::new(config().with_merge(MergePolicy::Suppress), SYSTEM, catalog()).unwrap();
        let plan = orchestrator.plan(&labels(&["Zool"]), &cache).unwrap();
        assert_eq!(plan.labels[0].decisions, suppressed);

        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog()).unwrap();
        let plan = orchestrator.plan(&labels(&["Zool"]), &cache).unwrap();
        assert!(plan.labels[0].decisions[0].is_fetch());

        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog())
            .unwrap()
            .with_source_changed(true);
        let plan = orchestrator.plan(&labels(&["Zool"]), &cache).unwrap();
        assert_eq!(plan.labels[0].decisions, suppressed);
    }

    #[test]
    fn test_marker_note_is_kept_on_plan() {
        let mut config = config();
        config.normalize.strip_round = false;
        config.normalize.before = Some("_".into());
        let orchestrator = Orchestrator::new(config, SYSTEM, catalog()).unwrap();
        let plan = orchestrator.plan_label(&Label::new("Zool (a_b)", "Amiga"), &[]);
        assert_eq!(plan.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_counts_and_isolates_failures() {
        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog()).unwrap();
        let cache = FakeCache::default().with("Zool", "Zool (Europe)");
        let executor = RecordingExecutor {
            fail_on: Some("Ishar".into()),
            ..RecordingExecutor::default()
        };

        let report = orchestrator
            .run(
                &labels(&["Ishar", "Zool", "Monkey Island 2", "Lemmings"]),
                &cache,
                &executor,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.kept, 1);
        assert_eq!(report.summary.fetched, 1);
        assert_eq!(report.summary.skipped, 1);
        assert!(report.labels[0].failed());
        assert!(report.labels[1].succeeded());
        assert!(!report.labels[3].succeeded());
        assert!(matches!(
            report.labels[3].outcomes[0].decision,
            Decision::Skip(SkipReason::NoMatch { .. })
        ));

        let applied = executor.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].0, "Monkey Island 2");
    }

    #[tokio::test]
    async fn test_execute_stops_after_cancel() {
        let orchestrator = Orchestrator::new(config(), SYSTEM, catalog()).unwrap();
        let cancel = CancellationToken::new();
        let executor = RecordingExecutor {
            cancel_after_first: Some(cancel.clone()),
            ..RecordingExecutor::default()
        };

        let report = orchestrator
            .run(&labels(&["Zool", "Ishar"]), &FakeCache::default(), &executor, &cancel)
            .await
            .unwrap();

        assert_eq!(report.summary.fetched, 1);
        assert_eq!(report.summary.cancelled, 1);
        assert_eq!(report.labels[1].outcomes[0].status, Status::Cancelled);
    }
}
