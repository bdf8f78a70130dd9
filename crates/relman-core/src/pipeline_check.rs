//! Production pipeline validation.
//!
//! For each production pipeline whose GitHub source is a managed-release
//! repository, the latest execution must have built the current head of the
//! production branch and must have succeeded.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReleaseConfig;
use crate::domain::{
    ExecutionStatus, ManagedRepository, PipelineExecutionRecord, ReleaseError, Result,
    SessionCredential,
};
use crate::ports::{PipelineProvider, SourceHost};
use crate::report::{Outcome, Phase, ReleaseReport};

/// Result of checking one pipeline against one source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineStatus {
    Succeeded,
    NoExecution,
    RevisionMismatch { revision: String, head: String },
    InProgress,
    NotSucceeded { status: String },
}

impl PipelineStatus {
    /// Compare the latest execution with the production branch head.
    ///
    /// Every source revision must match `head` (ignoring case) before the
    /// status is looked at; the first mismatch wins.
    pub fn evaluate(execution: Option<&PipelineExecutionRecord>, head: &str) -> Self {
        let Some(execution) = execution else {
            return Self::NoExecution;
        };
        for revision in &execution.source_revisions {
            info!(
                url = revision.revision_url.as_deref().unwrap_or(""),
                revision = %revision.revision_id,
                "source revision"
            );
            if !revision.revision_id.eq_ignore_ascii_case(head) {
                return Self::RevisionMismatch {
                    revision: revision.revision_id.clone(),
                    head: head.to_string(),
                };
            }
        }
        match &execution.status {
            ExecutionStatus::InProgress => Self::InProgress,
            ExecutionStatus::Succeeded => Self::Succeeded,
            ExecutionStatus::Other(status) => Self::NotSucceeded {
                status: status.clone(),
            },
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Succeeded => Outcome::Pass,
            _ => Outcome::Fail,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::NoExecution => "no_execution",
            Self::RevisionMismatch { .. } => "revision_mismatch",
            Self::InProgress => "in_progress",
            Self::NotSucceeded { .. } => "not_succeeded",
        }
    }

    fn message(&self, pipeline: &str, branch: &str) -> String {
        match self {
            Self::Succeeded => format!("pipeline {pipeline} has succeeded"),
            Self::NoExecution => format!(
                "no pipeline executions for {pipeline}, this is not correct. Please validate the pipeline and restart the process"
            ),
            Self::RevisionMismatch { revision, head } => format!(
                "pipeline revision {revision} does not match the {branch} commit {head}"
            ),
            Self::InProgress => format!(
                "pipeline {pipeline} is currently executing, please wait for this to complete before retrying the process"
            ),
            Self::NotSucceeded { status } => format!(
                "pipeline {pipeline} is currently {status}, please resolve any issues before retrying the process"
            ),
        }
    }
}

/// Validates production pipelines against production branch heads.
#[derive(Debug, Clone)]
pub struct PipelineValidator {
    pub org: String,
    pub managed_topic: String,
    pub production_branch: String,
    pub production_suffix: String,
    pub source_provider: String,
    pub repository_key: String,
}

impl PipelineValidator {
    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self {
            org: config.github.org.clone(),
            managed_topic: config.github.topic.clone(),
            production_branch: config.branches.production.clone(),
            production_suffix: config.pipelines.production_suffix.clone(),
            source_provider: config.pipelines.source_provider.clone(),
            repository_key: config.pipelines.repository_key.clone(),
        }
    }

    fn is_production(&self, name: &str) -> bool {
        name.to_lowercase()
            .ends_with(&self.production_suffix.to_lowercase())
    }

    /// Validate every qualifying pipeline and return the aggregate verdict.
    ///
    /// `credential` must be the artifacts-role credential.
    pub async fn validate(
        &self,
        pipelines: &dyn PipelineProvider,
        host: &dyn SourceHost,
        credential: &SessionCredential,
        report: &mut ReleaseReport,
    ) -> Result<bool> {
        info!("validating pipelines match expected commit ids");
        let names = pipelines.list_pipelines(credential).await?;
        if names.is_empty() {
            return Err(ReleaseError::not_found("pipelines", "issue retrieving pipelines"));
        }

        let mut can_continue = true;
        for name in names.iter().filter(|n| self.is_production(n)) {
            let definition = pipelines.get_pipeline(credential, name).await?;
            for repo_name in
                definition.source_repositories(&self.source_provider, &self.repository_key)
            {
                let repo = host
                    .repository(&format!("{}/{}", self.org, repo_name))
                    .await?;
                if !repo.has_topic(&self.managed_topic) {
                    report.record(
                        Phase::Pipelines,
                        name.clone(),
                        Outcome::Skipped,
                        "unmanaged_repository",
                        format!(
                            "skipping repository {} as it is not a {} repository",
                            repo.clone_url, self.managed_topic
                        ),
                    );
                    continue;
                }
                can_continue &= self
                    .validate_pipeline(pipelines, host, credential, name, &repo, report)
                    .await?;
            }
        }
        Ok(can_continue)
    }

    async fn validate_pipeline(
        &self,
        pipelines: &dyn PipelineProvider,
        host: &dyn SourceHost,
        credential: &SessionCredential,
        pipeline: &str,
        repo: &ManagedRepository,
        report: &mut ReleaseReport,
    ) -> Result<bool> {
        let execution = pipelines.latest_execution(credential, pipeline).await?;
        let status = match execution {
            Some(ref exec) if !exec.source_revisions.is_empty() => {
                let head = host.branch_head(repo, &self.production_branch).await?;
                PipelineStatus::evaluate(Some(exec), &head)
            }
            ref other => PipelineStatus::evaluate(other.as_ref(), ""),
        };

        report.record(
            Phase::Pipelines,
            format!("{pipeline} ({})", repo.name),
            status.outcome(),
            status.code(),
            status.message(pipeline, &self.production_branch),
        );
        Ok(status.outcome() == Outcome::Pass)
    }
}
