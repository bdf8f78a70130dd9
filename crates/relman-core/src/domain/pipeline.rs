//! Deployment pipeline definitions and execution records.
//!
//! These are read-only views of the pipeline provider; relman never mutates a
//! pipeline or an execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category of a pipeline action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Source,
    Build,
    Test,
    Deploy,
    Approval,
    Invoke,
    Other(String),
}

/// A single action inside a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineAction {
    pub name: String,
    pub category: ActionCategory,
    /// Provider of the action type, e.g. `GitHub` or `CodeBuild`.
    pub provider: String,
    /// Free-form action configuration (e.g. `Owner`, `Repo`, `Branch`).
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: String,
    pub actions: Vec<PipelineAction>,
}

/// Declared structure of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub stages: Vec<PipelineStage>,
}

impl PipelineDefinition {
    /// Repositories named by source actions of the given provider, in
    /// declaration order. Actions without `config_key` are ignored.
    pub fn source_repositories(&self, provider: &str, config_key: &str) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|stage| stage.actions.iter())
            .filter(|action| {
                action.category == ActionCategory::Source && action.provider == provider
            })
            .filter_map(|action| action.configuration.get(config_key).cloned())
            .collect()
    }
}

/// Terminal or transient state of a pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Succeeded,
    /// Any other provider status (`Failed`, `Stopped`, `Superseded`, ...).
    Other(String),
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::InProgress => f.write_str("InProgress"),
            ExecutionStatus::Succeeded => f.write_str("Succeeded"),
            ExecutionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Source revision recorded by an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRevision {
    pub action_name: String,
    pub revision_id: String,
    pub revision_url: Option<String>,
}

/// Most recent run of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineExecutionRecord {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub source_revisions: Vec<SourceRevision>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(category: ActionCategory, provider: &str, repo: Option<&str>) -> PipelineAction {
        let mut configuration = BTreeMap::new();
        if let Some(repo) = repo {
            configuration.insert("Repo".to_string(), repo.to_string());
        }
        PipelineAction {
            name: format!("{provider}-action"),
            category,
            provider: provider.to_string(),
            configuration,
        }
    }

    #[test]
    fn test_source_repositories_filters_category_and_provider() {
        let def = PipelineDefinition {
            name: "app-a-prod".to_string(),
            stages: vec![
                PipelineStage {
                    name: "Source".to_string(),
                    actions: vec![
                        action(ActionCategory::Source, "GitHub", Some("app-a")),
                        action(ActionCategory::Source, "S3", Some("bucket")),
                        action(ActionCategory::Source, "GitHub", None),
                    ],
                },
                PipelineStage {
                    name: "Build".to_string(),
                    actions: vec![action(ActionCategory::Build, "GitHub", Some("ignored"))],
                },
            ],
        };
        assert_eq!(def.source_repositories("GitHub", "Repo"), vec!["app-a"]);
    }

    #[test]
    fn test_execution_status_display() {
        assert_eq!(ExecutionStatus::InProgress.to_string(), "InProgress");
        assert_eq!(ExecutionStatus::Other("Stopped".into()).to_string(), "Stopped");
    }
}
