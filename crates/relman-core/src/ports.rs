//! Injectable collaborators for the external systems a release touches.
//!
//! Implement these traits to plug in the real GitHub and AWS clients, or the
//! in-memory fakes in [`crate::fakes`] for tests. Operations that need cloud
//! credentials take the [`SessionCredential`] explicitly; implementations must
//! not cache credentials between calls.

use async_trait::async_trait;

use crate::config::RoleProfile;
use crate::domain::{
    BranchPair, ManagedRepository, MfaCode, NewPullRequest, PipelineDefinition,
    PipelineExecutionRecord, PromotionRequest, Result, Role, SessionCredential, StateFilter,
    Visibility,
};

/// Search criteria for managed-release repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryQuery {
    pub org: String,
    pub topic: String,
    pub visibility: Visibility,
}

/// Criteria for listing pull requests on one repository.
///
/// Implementations return results newest first (by creation time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    pub state: StateFilter,
    pub base: Option<String>,
}

impl PullRequestQuery {
    pub fn open() -> Self {
        Self {
            state: StateFilter::Open,
            base: None,
        }
    }

    pub fn all_into(base: impl Into<String>) -> Self {
        Self {
            state: StateFilter::All,
            base: Some(base.into()),
        }
    }
}

/// Source-control host (GitHub).
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// All repositories matching `query`, following pagination to the end.
    async fn search_repositories(&self, query: &RepositoryQuery)
        -> Result<Vec<ManagedRepository>>;

    /// Look up a single repository by owner-qualified name.
    async fn repository(&self, full_name: &str) -> Result<ManagedRepository>;

    /// Pull requests matching `query`. The `mergeable` flag may be `None` in
    /// list results; use [`SourceHost::pull_request`] for the computed value.
    async fn list_pull_requests(
        &self,
        repo: &ManagedRepository,
        query: &PullRequestQuery,
    ) -> Result<Vec<PromotionRequest>>;

    /// Full detail of one pull request, including mergeability.
    async fn pull_request(&self, repo: &ManagedRepository, number: u64)
        -> Result<PromotionRequest>;

    async fn create_pull_request(
        &self,
        repo: &ManagedRepository,
        request: &NewPullRequest,
    ) -> Result<PromotionRequest>;

    async fn add_labels(
        &self,
        repo: &ManagedRepository,
        number: u64,
        labels: &[String],
    ) -> Result<()>;

    async fn merge_pull_request(&self, repo: &ManagedRepository, number: u64) -> Result<()>;

    /// Head commit SHA of `branch`.
    async fn branch_head(&self, repo: &ManagedRepository, branch: &str) -> Result<String>;
}

/// Deployment pipeline provider (CodePipeline).
#[async_trait]
pub trait PipelineProvider: Send + Sync {
    /// Names of every pipeline visible to `credential`.
    async fn list_pipelines(&self, credential: &SessionCredential) -> Result<Vec<String>>;

    async fn get_pipeline(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<PipelineDefinition>;

    /// Most recent execution of `name`, or `None` if it never ran.
    async fn latest_execution(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<Option<PipelineExecutionRecord>>;
}

/// Host on which environment promotions are opened (CodeCommit).
#[async_trait]
pub trait PromotionHost: Send + Sync {
    /// Open a pull request and return its identifier.
    async fn create_pull_request(
        &self,
        credential: &SessionCredential,
        repository: &str,
        branches: &BranchPair,
        title: &str,
    ) -> Result<String>;

    async fn merge_fast_forward(
        &self,
        credential: &SessionCredential,
        repository: &str,
        pull_request_id: &str,
    ) -> Result<()>;
}

/// Exchanges an MFA code for role-scoped session credentials (STS).
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    async fn assume_role(
        &self,
        role: Role,
        profile: &RoleProfile,
        code: &MfaCode,
    ) -> Result<SessionCredential>;
}
