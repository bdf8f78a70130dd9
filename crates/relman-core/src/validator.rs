//! Pull-request merge validation for a release.
//!
//! Every repository is evaluated and reported; a single unmerged pull request
//! anywhere makes the aggregate verdict fail.

use serde::{Deserialize, Serialize};

use crate::domain::{ManagedRepository, PromotionRequest, PullRequestState, ReleaseId, Result};
use crate::ports::{PullRequestQuery, SourceHost};
use crate::report::{Outcome, Phase, ReleaseReport};

/// Classification of one release pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestStatus {
    Merged,
    Draft,
    Closed,
    Blocked,
    /// The host has not finished computing mergeability yet.
    MergeabilityPending,
    /// A merge was issued during this pass; a rerun must confirm it.
    ForceMerged,
    AwaitingMerge,
}

impl PullRequestStatus {
    /// Classify `pr`. `force` only matters for open, mergeable pull requests.
    pub fn classify(pr: &PromotionRequest, force: bool) -> Self {
        match pr.state {
            PullRequestState::Merged => Self::Merged,
            PullRequestState::Draft => Self::Draft,
            PullRequestState::ClosedUnmerged => Self::Closed,
            PullRequestState::Open if pr.mergeable.is_none() => Self::MergeabilityPending,
            PullRequestState::Open if pr.mergeable == Some(false) => Self::Blocked,
            PullRequestState::Open if force => Self::ForceMerged,
            PullRequestState::Open => Self::AwaitingMerge,
        }
    }

    pub fn outcome(self) -> Outcome {
        match self {
            Self::Merged => Outcome::Pass,
            _ => Outcome::Fail,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Draft => "draft",
            Self::Closed => "closed",
            Self::Blocked => "blocked",
            Self::MergeabilityPending => "mergeability_pending",
            Self::ForceMerged => "force_merged",
            Self::AwaitingMerge => "awaiting_merge",
        }
    }

    fn message(self, url: &str) -> String {
        match self {
            Self::Merged => format!("PR {url} is merged"),
            Self::Draft => format!("PR {url} is draft, please remove or close"),
            Self::Closed => format!(
                "PR {url} was closed without merging, reopen it or remove the release label"
            ),
            Self::Blocked => {
                format!("PR {url} is not able to be merged, please validate status")
            }
            Self::MergeabilityPending => format!(
                "PR {url} mergeability is still being computed, rerun this process shortly"
            ),
            Self::ForceMerged => format!(
                "PR {url} is able to be merged, merging. Rerun this process to validate successful merge"
            ),
            Self::AwaitingMerge => format!(
                "PR {url} is not merged. Please manually merge or force merge using this tool and rerun this process to validate successful merge"
            ),
        }
    }
}

/// Checks that every pull request labeled with the release id has merged
/// into the production branch, optionally merging the mergeable ones.
#[derive(Debug, Clone)]
pub struct ReleaseValidator {
    release_id: ReleaseId,
    production_branch: String,
    force: bool,
}

impl ReleaseValidator {
    pub fn new(release_id: ReleaseId, production_branch: impl Into<String>, force: bool) -> Self {
        Self {
            release_id,
            production_branch: production_branch.into(),
            force,
        }
    }

    /// Validate all `repositories`, returning the aggregate verdict.
    ///
    /// Soft failures are recorded on `report`; host errors abort.
    pub async fn validate(
        &self,
        host: &dyn SourceHost,
        repositories: &[ManagedRepository],
        report: &mut ReleaseReport,
    ) -> Result<bool> {
        let mut can_continue = true;
        for repo in repositories {
            can_continue &= self.validate_repository(host, repo, report).await?;
        }
        Ok(can_continue)
    }

    async fn validate_repository(
        &self,
        host: &dyn SourceHost,
        repo: &ManagedRepository,
        report: &mut ReleaseReport,
    ) -> Result<bool> {
        tracing::info!(repo = %repo.name, "validating status of repository");
        let label = self.release_id.as_str();
        let listed = host
            .list_pull_requests(repo, &PullRequestQuery::all_into(&self.production_branch))
            .await?;
        let labeled: Vec<PromotionRequest> =
            listed.into_iter().filter(|pr| pr.has_label(label)).collect();

        if labeled.is_empty() {
            report.record(
                Phase::PullRequests,
                repo.name.clone(),
                Outcome::Skipped,
                "no_pull_requests",
                format!("no pull requests labeled {label} into {}", self.production_branch),
            );
            return Ok(true);
        }

        let mut can_continue = true;
        for listed_pr in labeled {
            let pr = if listed_pr.state == PullRequestState::Open {
                host.pull_request(repo, listed_pr.number).await?
            } else {
                listed_pr
            };
            let status = PullRequestStatus::classify(&pr, self.force);
            if status == PullRequestStatus::ForceMerged {
                host.merge_pull_request(repo, pr.number).await?;
            }
            report.record(
                Phase::PullRequests,
                format!("{}#{}", repo.name, pr.number),
                status.outcome(),
                status.code(),
                status.message(&pr.url),
            );
            can_continue &= status.outcome() == Outcome::Pass;
        }
        Ok(can_continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{pull_request, repo, FakeSourceHost, SourceCall};

    fn validator(force: bool) -> ReleaseValidator {
        ReleaseValidator::new(ReleaseId::new("REL-42").unwrap(), "prod", force)
    }

    fn merged(number: u64) -> PromotionRequest {
        let mut pr = pull_request(number, "stage", "prod", &["REL-42"]);
        pr.state = PullRequestState::Merged;
        pr
    }

    #[test]
    fn test_classification_table() {
        let mut pr = pull_request(1, "stage", "prod", &["REL-42"]);
        assert_eq!(PullRequestStatus::classify(&pr, false), PullRequestStatus::AwaitingMerge);
        assert_eq!(PullRequestStatus::classify(&pr, true), PullRequestStatus::ForceMerged);

        pr.mergeable = Some(false);
        assert_eq!(PullRequestStatus::classify(&pr, true), PullRequestStatus::Blocked);
        pr.mergeable = None;
        assert_eq!(
            PullRequestStatus::classify(&pr, true),
            PullRequestStatus::MergeabilityPending
        );

        pr.state = PullRequestState::Draft;
        assert_eq!(PullRequestStatus::classify(&pr, true), PullRequestStatus::Draft);
        pr.state = PullRequestState::Merged;
        assert_eq!(PullRequestStatus::classify(&pr, false), PullRequestStatus::Merged);
        pr.state = PullRequestState::ClosedUnmerged;
        assert_eq!(PullRequestStatus::classify(&pr, true), PullRequestStatus::Closed);
    }

    #[tokio::test]
    async fn test_all_merged_passes() {
        let host = FakeSourceHost::new();
        host.add_pull_request("app-a", merged(1));
        host.add_pull_request("app-b", merged(4));
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(false)
            .validate(&host, &[repo("app-a"), repo("app-b")], &mut report)
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(report.count(Outcome::Pass), 2);
    }

    #[tokio::test]
    async fn test_one_draft_fails_and_every_repo_is_reported() {
        let host = FakeSourceHost::new();
        let mut draft = pull_request(2, "stage", "prod", &["REL-42"]);
        draft.state = PullRequestState::Draft;
        host.add_pull_request("app-a", draft);
        host.add_pull_request("app-b", merged(3));
        host.add_pull_request("app-c", merged(5));
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(false)
            .validate(
                &host,
                &[repo("app-a"), repo("app-b"), repo("app-c")],
                &mut report,
            )
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.failures().next().unwrap().code, "draft");
    }

    #[tokio::test]
    async fn test_open_without_force_fails_without_merging() {
        let host = FakeSourceHost::new();
        host.add_pull_request("app-a", pull_request(9, "stage", "prod", &["REL-42"]));
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(false)
            .validate(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert!(host.calls().is_empty());
        assert_eq!(report.records[0].code, "awaiting_merge");
    }

    #[tokio::test]
    async fn test_force_merges_but_still_fails_this_pass() {
        let host = FakeSourceHost::new();
        host.add_pull_request("app-a", pull_request(9, "stage", "prod", &["REL-42"]));
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(true)
            .validate(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(
            host.calls(),
            vec![SourceCall::Merge {
                repo: "app-a".to_string(),
                number: 9
            }]
        );
        assert_eq!(report.records[0].code, "force_merged");

        // A rerun observes the merged state.
        let mut rerun = ReleaseReport::new("REL-42", "prepare-release");
        let ok = validator(true)
            .validate(&host, &[repo("app-a")], &mut rerun)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_force_does_not_merge_unmergeable() {
        let host = FakeSourceHost::new();
        let mut pr = pull_request(9, "stage", "prod", &["REL-42"]);
        pr.mergeable = Some(false);
        host.add_pull_request("app-a", pr);
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(true)
            .validate(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert!(host.calls().is_empty());
        assert_eq!(report.records[0].code, "blocked");
    }

    #[tokio::test]
    async fn test_uncomputed_mergeability_asks_for_rerun_without_merging() {
        let host = FakeSourceHost::new();
        let mut pr = pull_request(9, "stage", "prod", &["REL-42"]);
        pr.mergeable = None;
        host.add_pull_request("app-a", pr);
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(true)
            .validate(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert!(host.calls().is_empty());
        assert_eq!(report.records[0].code, "mergeability_pending");
        assert!(report.records[0].reason.contains("rerun"));
    }

    #[tokio::test]
    async fn test_ignores_unlabeled_and_other_base() {
        let host = FakeSourceHost::new();
        host.add_pull_request("app-a", pull_request(1, "feature", "prod", &[]));
        host.add_pull_request("app-a", pull_request(2, "stage", "uat", &["REL-42"]));
        let mut report = ReleaseReport::new("REL-42", "prepare-release");

        let ok = validator(false)
            .validate(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(report.records[0].code, "no_pull_requests");
    }
}
