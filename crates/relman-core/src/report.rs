//! Structured release reports.
//!
//! Every step of a run appends `(entity, outcome, reason)` records to a
//! [`ReleaseReport`]. The report is returned to the caller, logged as it is
//! built, and can be rendered as text for operators or serialized to JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::obs::emit_check;

/// Verdict contributed by a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    /// Observed but excluded from the verdict.
    Skipped,
}

/// Which part of the release process produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Select,
    Initialize,
    PullRequests,
    Pipelines,
    Deploy,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Select => "select",
            Phase::Initialize => "initialize",
            Phase::PullRequests => "pull-requests",
            Phase::Pipelines => "pipelines",
            Phase::Deploy => "deploy",
        };
        f.write_str(s)
    }
}

/// One observation about one entity (repository, pull request, pipeline, step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub phase: Phase,
    pub entity: String,
    pub outcome: Outcome,
    /// Stable machine-readable classification, e.g. `draft` or `revision_mismatch`.
    pub code: String,
    /// Human-readable explanation or remediation.
    pub reason: String,
}

/// Accumulated records for one command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseReport {
    pub release_id: String,
    pub command: String,
    pub records: Vec<CheckRecord>,
    pub generated_at: DateTime<Utc>,
}

impl ReleaseReport {
    pub fn new(release_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            release_id: release_id.into(),
            command: command.into(),
            records: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Append a record and log it.
    pub fn record(
        &mut self,
        phase: Phase,
        entity: impl Into<String>,
        outcome: Outcome,
        code: impl Into<String>,
        reason: impl Into<String>,
    ) {
        let record = CheckRecord {
            phase,
            entity: entity.into(),
            outcome,
            code: code.into(),
            reason: reason.into(),
        };
        emit_check(&record);
        self.records.push(record);
    }

    /// `true` when no record failed.
    pub fn passed(&self) -> bool {
        self.records.iter().all(|r| r.outcome != Outcome::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckRecord> {
        self.records.iter().filter(|r| r.outcome == Outcome::Fail)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Render as plain text, one record per line, followed by a summary.
    pub fn render_text(&self) -> String {
        let mut out = format!("{} {}\n", self.command, self.release_id);
        for r in &self.records {
            let marker = match r.outcome {
                Outcome::Pass => "ok  ",
                Outcome::Fail => "FAIL",
                Outcome::Skipped => "skip",
            };
            out.push_str(&format!(
                "  [{marker}] {:<13} {} ({}): {}\n",
                r.phase.to_string(),
                r.entity,
                r.code,
                r.reason
            ));
        }
        out.push_str(&format!(
            "{} passed, {} failed, {} skipped\n",
            self.count(Outcome::Pass),
            self.count(Outcome::Fail),
            self.count(Outcome::Skipped)
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_passes() {
        let report = ReleaseReport::new("REL-1", "prepare-release");
        assert!(report.passed());
        assert_eq!(report.count(Outcome::Pass), 0);
    }

    #[test]
    fn test_single_failure_fails_report() {
        let mut report = ReleaseReport::new("REL-1", "prepare-release");
        report.record(Phase::PullRequests, "app-a#1", Outcome::Pass, "merged", "merged");
        report.record(Phase::PullRequests, "app-b#2", Outcome::Fail, "draft", "draft");
        report.record(Phase::Pipelines, "lib-prod", Outcome::Skipped, "unmanaged", "not managed");
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_render_text_lists_every_record() {
        let mut report = ReleaseReport::new("REL-7", "prepare-release");
        report.record(Phase::PullRequests, "app-a#3", Outcome::Fail, "blocked", "not mergeable");
        let text = report.render_text();
        assert!(text.starts_with("prepare-release REL-7"));
        assert!(text.contains("[FAIL]"));
        assert!(text.contains("app-a#3 (blocked): not mergeable"));
        assert!(text.contains("0 passed, 1 failed, 0 skipped"));
    }

    #[test]
    fn test_report_serializes_snake_case() {
        let mut report = ReleaseReport::new("REL-7", "deploy-release");
        report.record(Phase::Deploy, "stage -> uat", Outcome::Pass, "opened", "pr 12");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["records"][0]["phase"], "deploy");
        assert_eq!(json["records"][0]["outcome"], "pass");
    }
}
