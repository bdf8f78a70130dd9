//! CodePipeline provider.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_codepipeline::config::{BehaviorVersion, Region};
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types;
use tracing::debug;

use relman_core::domain::{
    ActionCategory, ExecutionStatus, PipelineAction, PipelineDefinition, PipelineExecutionRecord,
    PipelineStage, SourceRevision,
};
use relman_core::{PipelineProvider, Result, SessionCredential};

use crate::error::AwsError;
use crate::session::{ensure_fresh, opt, static_credentials};

const SERVICE: &str = "codepipeline";

pub fn map_category(category: &types::ActionCategory) -> ActionCategory {
    match category {
        types::ActionCategory::Source => ActionCategory::Source,
        types::ActionCategory::Build => ActionCategory::Build,
        types::ActionCategory::Test => ActionCategory::Test,
        types::ActionCategory::Deploy => ActionCategory::Deploy,
        types::ActionCategory::Approval => ActionCategory::Approval,
        types::ActionCategory::Invoke => ActionCategory::Invoke,
        other => ActionCategory::Other(other.as_str().to_string()),
    }
}

pub fn map_status(status: Option<&types::PipelineExecutionStatus>) -> ExecutionStatus {
    match status {
        Some(types::PipelineExecutionStatus::InProgress) => ExecutionStatus::InProgress,
        Some(types::PipelineExecutionStatus::Succeeded) => ExecutionStatus::Succeeded,
        Some(other) => ExecutionStatus::Other(other.as_str().to_string()),
        None => ExecutionStatus::Other("Unknown".to_string()),
    }
}

fn map_action(action: &types::ActionDeclaration) -> PipelineAction {
    let type_id = opt::<types::ActionTypeId>(action.action_type_id());
    PipelineAction {
        name: opt::<str>(action.name()).unwrap_or_default().to_string(),
        category: type_id
            .and_then(|t| opt::<types::ActionCategory>(t.category()))
            .map(map_category)
            .unwrap_or_else(|| ActionCategory::Other("Unknown".to_string())),
        provider: type_id
            .and_then(|t| opt::<str>(t.provider()))
            .unwrap_or_default()
            .to_string(),
        configuration: action
            .configuration()
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_else(BTreeMap::new),
    }
}

pub fn map_pipeline(name: &str, declaration: &types::PipelineDeclaration) -> PipelineDefinition {
    PipelineDefinition {
        name: name.to_string(),
        stages: declaration
            .stages()
            .iter()
            .map(|stage| PipelineStage {
                name: opt::<str>(stage.name()).unwrap_or_default().to_string(),
                actions: stage.actions().iter().map(map_action).collect(),
            })
            .collect(),
    }
}

pub fn map_execution(summary: &types::PipelineExecutionSummary) -> PipelineExecutionRecord {
    PipelineExecutionRecord {
        execution_id: summary
            .pipeline_execution_id()
            .unwrap_or_default()
            .to_string(),
        status: map_status(summary.status()),
        source_revisions: summary
            .source_revisions()
            .iter()
            .map(|r| SourceRevision {
                action_name: opt::<str>(r.action_name()).unwrap_or_default().to_string(),
                revision_id: r.revision_id().unwrap_or_default().to_string(),
                revision_url: r.revision_url().map(str::to_string),
            })
            .collect(),
    }
}

/// Reads pipelines with the artifacts-role credential supplied per call.
#[derive(Debug, Clone)]
pub struct CodePipelineProvider {
    region: String,
}

impl CodePipelineProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    fn client(
        &self,
        credential: &SessionCredential,
    ) -> std::result::Result<aws_sdk_codepipeline::Client, AwsError> {
        ensure_fresh(credential)?;
        let config = aws_sdk_codepipeline::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(static_credentials(credential))
            .build();
        Ok(aws_sdk_codepipeline::Client::from_conf(config))
    }
}

#[async_trait]
impl PipelineProvider for CodePipelineProvider {
    async fn list_pipelines(&self, credential: &SessionCredential) -> Result<Vec<String>> {
        let client = self.client(credential)?;
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = client
                .list_pipelines()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| AwsError::service(SERVICE, DisplayErrorContext(&e)))?;
            names.extend(
                output
                    .pipelines()
                    .iter()
                    .filter_map(|p| p.name().map(str::to_string)),
            );
            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        debug!(count = names.len(), "listed pipelines");
        Ok(names)
    }

    async fn get_pipeline(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<PipelineDefinition> {
        let output = self
            .client(credential)?
            .get_pipeline()
            .name(name)
            .send()
            .await
            .map_err(|e| AwsError::service(SERVICE, DisplayErrorContext(&e)))?;
        let declaration = opt::<types::PipelineDeclaration>(output.pipeline()).ok_or(
            AwsError::MissingField {
                service: SERVICE,
                field: "pipeline",
            },
        )?;
        Ok(map_pipeline(name, declaration))
    }

    async fn latest_execution(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<Option<PipelineExecutionRecord>> {
        let output = self
            .client(credential)?
            .list_pipeline_executions()
            .pipeline_name(name)
            .max_results(1)
            .send()
            .await
            .map_err(|e| AwsError::service(SERVICE, DisplayErrorContext(&e)))?;
        Ok(output.pipeline_execution_summaries().first().map(map_execution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            map_status(Some(&types::PipelineExecutionStatus::InProgress)),
            ExecutionStatus::InProgress
        );
        assert_eq!(
            map_status(Some(&types::PipelineExecutionStatus::Succeeded)),
            ExecutionStatus::Succeeded
        );
        assert_eq!(
            map_status(Some(&types::PipelineExecutionStatus::Failed)),
            ExecutionStatus::Other("Failed".to_string())
        );
        assert_eq!(
            map_status(Some(&types::PipelineExecutionStatus::Superseded)),
            ExecutionStatus::Other("Superseded".to_string())
        );
    }

    #[tokio::test]
    async fn test_expired_credential_fails_before_any_call() {
        use relman_core::{ReleaseError, Role};

        let stale = SessionCredential::new(
            Role::Artifacts,
            "ASIAXYZ",
            "secret",
            "token",
            Some(chrono::Utc::now() - chrono::Duration::hours(2)),
        );
        let err = CodePipelineProvider::new("us-west-2")
            .list_pipelines(&stale)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Authentication(_)));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(map_category(&types::ActionCategory::Source), ActionCategory::Source);
        assert_eq!(map_category(&types::ActionCategory::Deploy), ActionCategory::Deploy);
    }

    #[test]
    fn test_execution_mapping() {
        let summary = types::PipelineExecutionSummary::builder()
            .pipeline_execution_id("exec-1")
            .status(types::PipelineExecutionStatus::Succeeded)
            .source_revisions(
                types::SourceRevision::builder()
                    .action_name("Source")
                    .revision_id("abc123")
                    .revision_url("https://github.com/moxionio/app-a/commit/abc123")
                    .build()
                    .unwrap(),
            )
            .build();

        let record = map_execution(&summary);
        assert_eq!(record.execution_id, "exec-1");
        assert_eq!(record.status, ExecutionStatus::Succeeded);
        assert_eq!(record.source_revisions[0].revision_id, "abc123");
        assert_eq!(record.source_revisions[0].action_name, "Source");
    }
}
