//! Environment promotion on the deployment repository.

use tracing::info;

use crate::domain::{DeployTarget, ReleaseId, Result, SessionCredential};
use crate::ports::PromotionHost;
use crate::report::{Outcome, Phase, ReleaseReport};

/// Opens (and with `force`, fast-forward merges) the promotion pull requests
/// of a deploy target, in chain order.
///
/// Steps are not verified after they are issued: a merge that the host
/// accepts but does not apply is not detected. A host error aborts the rest
/// of the chain.
#[derive(Debug, Clone)]
pub struct ReleaseDeployer {
    repository: String,
    release_id: ReleaseId,
    force: bool,
}

impl ReleaseDeployer {
    pub fn new(repository: impl Into<String>, release_id: ReleaseId, force: bool) -> Self {
        Self {
            repository: repository.into(),
            release_id,
            force,
        }
    }

    /// Run the promotion chain for `target` using `credential` (shared role).
    pub async fn deploy(
        &self,
        host: &dyn PromotionHost,
        credential: &SessionCredential,
        target: DeployTarget,
        report: &mut ReleaseReport,
    ) -> Result<()> {
        info!(target = target.label(), repository = %self.repository, "deploying release");
        let title = self.release_id.pull_request_title();
        for branches in target.chain() {
            let id = host
                .create_pull_request(credential, &self.repository, &branches, &title)
                .await?;
            info!(%branches, pull_request_id = %id, "created pull request");

            if self.force {
                host.merge_fast_forward(credential, &self.repository, &id)
                    .await?;
                report.record(
                    Phase::Deploy,
                    branches.to_string(),
                    Outcome::Pass,
                    "merged",
                    format!("pull request {id} opened and fast-forward merged"),
                );
            } else {
                report.record(
                    Phase::Deploy,
                    branches.to_string(),
                    Outcome::Pass,
                    "opened",
                    format!("pull request {id} opened, merge it to continue the promotion"),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchPair, Role};
    use crate::fakes::{credential, FakePromotionHost, PromotionCall};

    fn deployer(force: bool) -> ReleaseDeployer {
        ReleaseDeployer::new("moxion_application", ReleaseId::new("REL-42").unwrap(), force)
    }

    fn create(source: &str, destination: &str) -> PromotionCall {
        PromotionCall::Create {
            role: Role::Shared,
            repository: "moxion_application".to_string(),
            branches: BranchPair::new(source, destination),
            title: "Production Release REL-42".to_string(),
        }
    }

    fn merge(id: &str) -> PromotionCall {
        PromotionCall::MergeFastForward {
            role: Role::Shared,
            repository: "moxion_application".to_string(),
            pull_request_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_uat_without_force_opens_both_steps() {
        let host = FakePromotionHost::new();
        let mut report = ReleaseReport::new("REL-42", "deploy-release");

        deployer(false)
            .deploy(&host, &credential(Role::Shared), DeployTarget::Uat, &mut report)
            .await
            .unwrap();

        assert_eq!(host.calls(), vec![create("stage", "uat"), create("uat", "oa")]);
        assert_eq!(report.records.len(), 2);
        assert!(report.records.iter().all(|r| r.code == "opened"));
    }

    #[tokio::test]
    async fn test_uat_with_force_merges_each_step_before_the_next() {
        let host = FakePromotionHost::new();
        let mut report = ReleaseReport::new("REL-42", "deploy-release");

        deployer(true)
            .deploy(&host, &credential(Role::Shared), DeployTarget::Uat, &mut report)
            .await
            .unwrap();

        assert_eq!(
            host.calls(),
            vec![
                create("stage", "uat"),
                merge("1"),
                create("uat", "oa"),
                merge("2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_production_is_single_step() {
        let host = FakePromotionHost::new();
        let mut report = ReleaseReport::new("REL-42", "deploy-release");

        deployer(true)
            .deploy(
                &host,
                &credential(Role::Shared),
                DeployTarget::Production,
                &mut report,
            )
            .await
            .unwrap();

        assert_eq!(host.calls(), vec![create("uat", "prod"), merge("1")]);
        assert_eq!(report.records[0].entity, "uat -> prod");
    }

    #[tokio::test]
    async fn test_host_error_stops_the_chain() {
        let host = FakePromotionHost::new();
        host.fail_on(BranchPair::new("stage", "uat"));
        let mut report = ReleaseReport::new("REL-42", "deploy-release");

        let result = deployer(true)
            .deploy(&host, &credential(Role::Shared), DeployTarget::Uat, &mut report)
            .await;

        assert!(result.is_err());
        assert!(host.calls().is_empty());
        assert!(report.records.is_empty());
    }
}
