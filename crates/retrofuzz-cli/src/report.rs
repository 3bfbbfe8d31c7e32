//! Human-readable run output.

use retrofuzz_core::orchestrator::{LabelReport, Status};
use retrofuzz_core::RunReport;

/// One line per label: score, outcome and the compared normalized names.
pub fn label_line(report: &LabelReport) -> String {
    let plan = &report.plan;
    let score = plan.best.as_ref().map(|b| b.score).unwrap_or(0);
    let candidate = plan.best.as_ref().map(|b| b.candidate.as_str()).unwrap_or("");
    let outcome = if report.succeeded() { "Success" } else { "Failure" };
    let mut line = format!("{:>3}% {}: {} -> {}", score, outcome, plan.normalized, candidate);
    if plan.tied {
        line.push_str(&format!(" ({} tied)", plan.chosen.len()));
    }
    line
}

fn status_suffix(status: &Status) -> String {
    match status {
        Status::Applied => String::new(),
        Status::Failed(message) => format!(" [failed: {}]", message),
        Status::Cancelled => " [cancelled]".to_string(),
    }
}

pub fn print(report: &RunReport, verbose: bool, dry_run: bool) {
    for label in &report.labels {
        println!("{}", label_line(label));
        if verbose {
            println!("     {}", label.plan.label.text);
            for outcome in &label.outcomes {
                println!("     {}{}", outcome.decision, status_suffix(&outcome.status));
            }
        }
    }
    if verbose {
        for label in &report.out_of_scope {
            println!("     out of scope: {}", label.text);
        }
    }

    let prefix = if dry_run { "dry run: " } else { "" };
    println!("{}{}: {}", prefix, report.category, report.summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrofuzz_core::orchestrator::{BestMatch, DecisionOutcome, LabelPlan};
    use retrofuzz_core::{Decision, Label, SkipReason};

    fn report(best: Option<(&str, u8)>, decision: Decision, status: Status) -> LabelReport {
        LabelReport {
            plan: LabelPlan {
                label: Label::new("Zool (Europe)", "Commodore - Amiga"),
                normalized: "zool".to_string(),
                notes: Vec::new(),
                best: best.map(|(candidate, score)| BestMatch {
                    remote: candidate.to_string(),
                    score,
                    candidate: candidate.to_lowercase(),
                }),
                chosen: Vec::new(),
                tied: false,
                reset: false,
                decisions: vec![decision.clone()],
            },
            outcomes: vec![DecisionOutcome { decision, status }],
        }
    }

    #[test]
    fn test_label_line_success() {
        let entry = retrofuzz_core::RemoteEntry::new("Zool", "Commodore - Amiga");
        let line = label_line(&report(Some(("Zool", 100)), Decision::Fetch(entry), Status::Applied));
        assert_eq!(line, "100% Success: zool -> zool");
    }

    #[test]
    fn test_label_line_failure() {
        let skip = Decision::Skip(SkipReason::NoMatch { best_score: Some(42) });
        let line = label_line(&report(Some(("Zoom", 42)), skip, Status::Applied));
        assert_eq!(line, " 42% Failure: zool -> zoom");

        let skip = Decision::Skip(SkipReason::NoMatch { best_score: None });
        assert_eq!(label_line(&report(None, skip, Status::Applied)), "  0% Failure: zool -> ");
    }
}
