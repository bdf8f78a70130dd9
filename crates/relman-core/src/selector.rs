//! Managed-release repository discovery.

use tracing::info;

use crate::domain::{ManagedRepository, Result};
use crate::ports::{RepositoryQuery, SourceHost};
use crate::report::{Outcome, Phase, ReleaseReport};

/// Finds the repositories that take part in a release.
///
/// Every call re-queries the host, so a selector can be reused across steps
/// without going stale.
#[derive(Debug, Clone)]
pub struct RepositorySelector {
    query: RepositoryQuery,
    allow_list: Vec<String>,
}

impl RepositorySelector {
    pub fn new(query: RepositoryQuery) -> Self {
        Self {
            query,
            allow_list: Vec::new(),
        }
    }

    /// Restrict selection to repositories whose name or clone URL matches one
    /// of `entries` (case-insensitive). An empty list selects everything.
    pub fn with_allow_list(mut self, entries: Vec<String>) -> Self {
        self.allow_list = entries
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn allowed(&self, repo: &ManagedRepository) -> bool {
        self.allow_list.is_empty() || self.allow_list.iter().any(|e| repo.matches_filter(e))
    }

    /// Query the host and return the repositories to process.
    ///
    /// Repositories outside the allow-list are excluded and recorded as
    /// skipped on `report`.
    pub async fn select(
        &self,
        host: &dyn SourceHost,
        report: &mut ReleaseReport,
    ) -> Result<Vec<ManagedRepository>> {
        let found = host.search_repositories(&self.query).await?;
        info!(
            org = %self.query.org,
            topic = %self.query.topic,
            count = found.len(),
            "found {} repositories for the org",
            found.len()
        );

        let mut selected = Vec::with_capacity(found.len());
        for repo in found {
            if self.allowed(&repo) {
                selected.push(repo);
            } else {
                report.record(
                    Phase::Select,
                    repo.name.clone(),
                    Outcome::Skipped,
                    "not_requested",
                    "not in the supplied repository list",
                );
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Visibility;
    use crate::fakes::{repo, FakeSourceHost};

    fn query() -> RepositoryQuery {
        RepositoryQuery {
            org: "moxionio".to_string(),
            topic: "managed-release".to_string(),
            visibility: Visibility::Private,
        }
    }

    #[tokio::test]
    async fn test_select_all_without_allow_list() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        host.add_repository(repo("app-b"));
        let mut report = ReleaseReport::new("REL-1", "test");

        let selected = RepositorySelector::new(query())
            .select(&host, &mut report)
            .await
            .unwrap();
        assert_eq!(selected.len(), 2);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_allow_list_excludes_other_repositories() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        host.add_repository(repo("app-b"));
        let mut report = ReleaseReport::new("REL-1", "test");

        let selected = RepositorySelector::new(query())
            .with_allow_list(vec!["APP-B".to_string()])
            .select(&host, &mut report)
            .await
            .unwrap();
        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["app-b"]);
        assert_eq!(report.count(Outcome::Skipped), 1);
        assert_eq!(report.records[0].entity, "app-a");
    }

    #[tokio::test]
    async fn test_allow_list_matches_clone_url() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        let mut report = ReleaseReport::new("REL-1", "test");

        let selected = RepositorySelector::new(query())
            .with_allow_list(vec!["https://github.com/moxionio/app-a.git".to_string()])
            .select(&host, &mut report)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn test_untagged_repositories_are_not_returned() {
        let host = FakeSourceHost::new();
        host.add_repository(repo("app-a"));
        let mut untagged = repo("scratch");
        untagged.topics.clear();
        host.add_repository(untagged);
        let mut report = ReleaseReport::new("REL-1", "test");

        let selected = RepositorySelector::new(query())
            .select(&host, &mut report)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "app-a");
    }
}
