//! Release initialization: one labeled production pull request per repository.

use tracing::info;

use crate::domain::{ManagedRepository, NewPullRequest, ReleaseId, Result};
use crate::ports::{PullRequestQuery, SourceHost};
use crate::report::{Outcome, Phase, ReleaseReport};

/// Opens the production pull request for a release in every repository that
/// does not already have one.
///
/// Idempotent across reruns: a repository with an open pull request labeled
/// with the release id is left alone. The check-then-create sequence is not
/// transactional, so two concurrent runs for the same release can still race
/// and open duplicates.
#[derive(Debug, Clone)]
pub struct ReleaseInitializer {
    release_id: ReleaseId,
    base_branch: String,
    production_branch: String,
}

impl ReleaseInitializer {
    pub fn new(
        release_id: ReleaseId,
        base_branch: impl Into<String>,
        production_branch: impl Into<String>,
    ) -> Self {
        Self {
            release_id,
            base_branch: base_branch.into(),
            production_branch: production_branch.into(),
        }
    }

    /// Ensure each repository has its release pull request.
    ///
    /// Host errors are not retried and abort the run.
    pub async fn run(
        &self,
        host: &dyn SourceHost,
        repositories: &[ManagedRepository],
        report: &mut ReleaseReport,
    ) -> Result<()> {
        for repo in repositories {
            self.ensure_pull_request(host, repo, report).await?;
        }
        Ok(())
    }

    async fn ensure_pull_request(
        &self,
        host: &dyn SourceHost,
        repo: &ManagedRepository,
        report: &mut ReleaseReport,
    ) -> Result<()> {
        let label = self.release_id.as_str();
        let open = host
            .list_pull_requests(repo, &PullRequestQuery::open())
            .await?;

        if let Some(existing) = open.iter().find(|pr| pr.has_label(label)) {
            report.record(
                Phase::Initialize,
                repo.name.clone(),
                Outcome::Pass,
                "existing",
                format!("pull request already exists: {}", existing.url),
            );
            return Ok(());
        }

        info!(repo = %repo.clone_url, "pull request does not exist, creating");
        let created = host
            .create_pull_request(
                repo,
                &NewPullRequest {
                    title: self.release_id.pull_request_title(),
                    head: self.base_branch.clone(),
                    base: self.production_branch.clone(),
                    body: String::new(),
                },
            )
            .await?;
        host.add_labels(repo, created.number, &[label.to_string()])
            .await?;

        report.record(
            Phase::Initialize,
            repo.name.clone(),
            Outcome::Pass,
            "created",
            format!(
                "opened {} -> {}: {}",
                self.base_branch, self.production_branch, created.url
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{pull_request, repo, FakeSourceHost, SourceCall};

    fn initializer() -> ReleaseInitializer {
        ReleaseInitializer::new(ReleaseId::new("REL-42").unwrap(), "stage", "prod")
    }

    #[tokio::test]
    async fn test_creates_and_labels_missing_pull_request() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        let mut report = ReleaseReport::new("REL-42", "initialize-release");

        initializer()
            .run(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();

        assert_eq!(
            host.calls(),
            vec![
                SourceCall::CreatePullRequest {
                    repo: "app-a".to_string(),
                    title: "Production Release REL-42".to_string(),
                    head: "stage".to_string(),
                    base: "prod".to_string(),
                },
                SourceCall::AddLabels {
                    repo: "app-a".to_string(),
                    number: 1,
                    labels: vec!["REL-42".to_string()],
                },
            ]
        );
        assert_eq!(report.records[0].code, "created");
    }

    #[tokio::test]
    async fn test_existing_labeled_pull_request_is_left_alone() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        host.add_pull_request("app-a", pull_request(7, "stage", "prod", &["REL-42"]));
        let mut report = ReleaseReport::new("REL-42", "initialize-release");

        initializer()
            .run(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();

        assert!(host.calls().is_empty());
        assert_eq!(report.records[0].code, "existing");
    }

    #[tokio::test]
    async fn test_other_release_label_does_not_count() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        host.add_pull_request("app-a", pull_request(7, "stage", "prod", &["REL-41"]));
        let mut report = ReleaseReport::new("REL-42", "initialize-release");

        initializer()
            .run(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();

        assert_eq!(host.pull_requests("app-a").len(), 2);
    }

    #[tokio::test]
    async fn test_hotfix_base_branch() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        let mut report = ReleaseReport::new("REL-43", "initialize-release");

        ReleaseInitializer::new(ReleaseId::new("REL-43").unwrap(), "hotfix", "prod")
            .run(&host, &[repo("app-a")], &mut report)
            .await
            .unwrap();

        let created = &host.pull_requests("app-a")[0];
        assert_eq!(created.head, "hotfix");
        assert_eq!(created.base, "prod");
    }

    #[tokio::test]
    async fn test_host_error_aborts_remaining_repositories() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        host.add_repository(repo("app-b"));
        host.fail_writes_for("app-a");
        let mut report = ReleaseReport::new("REL-42", "initialize-release");

        let result = initializer()
            .run(&host, &[repo("app-a"), repo("app-b")], &mut report)
            .await;

        assert!(result.is_err());
        assert!(host.pull_requests("app-b").is_empty());
    }
}
