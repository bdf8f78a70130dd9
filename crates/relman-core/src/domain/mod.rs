//! Domain models for relman.
//!
//! Canonical definitions for the entities a release run reasons about:
//! - `ReleaseId`: correlation key carried as a pull-request label
//! - `ManagedRepository`: repository tagged for managed release
//! - `PromotionRequest`: pull request between two environment branches
//! - `PipelineExecutionRecord`: latest run of a production pipeline
//! - `SessionCredential`: role-scoped temporary credentials

pub mod credential;
pub mod error;
pub mod pipeline;
pub mod pull_request;
pub mod release;
pub mod repository;

pub use credential::{MfaCode, Role, SessionCredential};
pub use error::{ReleaseError, Result};
pub use pipeline::{
    ActionCategory, ExecutionStatus, PipelineAction, PipelineDefinition, PipelineExecutionRecord,
    PipelineStage, SourceRevision,
};
pub use pull_request::{NewPullRequest, PromotionRequest, PullRequestState, StateFilter};
pub use release::{BranchPair, DeployTarget, ReleaseId};
pub use repository::{ManagedRepository, Visibility};
