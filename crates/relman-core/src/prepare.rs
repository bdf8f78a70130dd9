//! The prepare-release protocol: pull-request validation, then pipelines.

use tracing::info;

use crate::config::ReleaseConfig;
use crate::domain::{ManagedRepository, ReleaseId, Result, SessionCredential};
use crate::pipeline_check::PipelineValidator;
use crate::ports::{PipelineProvider, SourceHost};
use crate::report::ReleaseReport;
use crate::validator::ReleaseValidator;

pub const NOT_READY_MESSAGE: &str = "Please fix and validate issues and rerun this process";
pub const READY_MESSAGE: &str = "No issues, you can now continue to run deploy-release";

/// Verdict of one prepare-release pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareVerdict {
    pub pull_requests_passed: bool,
    /// `None` when the pipeline check was not reached.
    pub pipelines_passed: Option<bool>,
}

impl PrepareVerdict {
    pub fn ready(&self) -> bool {
        self.pull_requests_passed && self.pipelines_passed == Some(true)
    }

    pub fn conclusion(&self) -> &'static str {
        if self.ready() {
            READY_MESSAGE
        } else {
            NOT_READY_MESSAGE
        }
    }
}

/// Runs the release validator and, only when every pull request has merged,
/// the pipeline validator.
#[derive(Debug, Clone)]
pub struct PrepareRelease {
    validator: ReleaseValidator,
    pipelines: PipelineValidator,
}

impl PrepareRelease {
    pub fn new(config: &ReleaseConfig, release_id: ReleaseId, force: bool) -> Self {
        Self {
            validator: ReleaseValidator::new(release_id, &config.branches.production, force),
            pipelines: PipelineValidator::from_config(config),
        }
    }

    pub async fn run(
        &self,
        host: &dyn SourceHost,
        pipelines: &dyn PipelineProvider,
        credential: &SessionCredential,
        repositories: &[ManagedRepository],
        report: &mut ReleaseReport,
    ) -> Result<PrepareVerdict> {
        let pull_requests_passed = self.validator.validate(host, repositories, report).await?;
        if !pull_requests_passed {
            info!("pull requests are not all merged, skipping pipeline validation");
            return Ok(PrepareVerdict {
                pull_requests_passed,
                pipelines_passed: None,
            });
        }

        let pipelines_passed = self
            .pipelines
            .validate(pipelines, host, credential, report)
            .await?;
        Ok(PrepareVerdict {
            pull_requests_passed,
            pipelines_passed: Some(pipelines_passed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conclusion_requires_both_checks() {
        let blocked = PrepareVerdict {
            pull_requests_passed: false,
            pipelines_passed: None,
        };
        assert_eq!(blocked.conclusion(), NOT_READY_MESSAGE);

        let stale = PrepareVerdict {
            pull_requests_passed: true,
            pipelines_passed: Some(false),
        };
        assert!(!stale.ready());

        let ready = PrepareVerdict {
            pull_requests_passed: true,
            pipelines_passed: Some(true),
        };
        assert_eq!(ready.conclusion(), READY_MESSAGE);
    }
}
