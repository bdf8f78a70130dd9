//! In-memory fakes for the host traits (testing only)
//!
//! Provides `FakeSourceHost`, `FakePipelineProvider`, `FakePromotionHost` and
//! `FakeIdentityBroker`. Each fake records the write calls it receives so
//! tests can assert on call order and arguments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::RoleProfile;
use crate::domain::{
    BranchPair, ManagedRepository, MfaCode, NewPullRequest, PipelineDefinition,
    PipelineExecutionRecord, PromotionRequest, PullRequestState, ReleaseError, Result, Role,
    SessionCredential, StateFilter,
};
use crate::ports::{
    IdentityBroker, PipelineProvider, PromotionHost, PullRequestQuery, RepositoryQuery, SourceHost,
};

/// A managed-release repository under the `moxionio` org.
pub fn repo(name: &str) -> ManagedRepository {
    ManagedRepository {
        name: name.to_string(),
        full_name: format!("moxionio/{name}"),
        clone_url: format!("https://github.com/moxionio/{name}.git"),
        html_url: format!("https://github.com/moxionio/{name}"),
        topics: vec!["managed-release".to_string()],
    }
}

/// An open pull request from `head` into `base`, mergeable, with `labels`.
pub fn pull_request(number: u64, head: &str, base: &str, labels: &[&str]) -> PromotionRequest {
    PromotionRequest {
        number,
        title: format!("PR {number}"),
        url: format!("https://github.com/moxionio/repo/pull/{number}"),
        head: head.to_string(),
        base: base.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        state: PullRequestState::Open,
        mergeable: Some(true),
    }
}

// ---------------------------------------------------------------------------
// FakeSourceHost
// ---------------------------------------------------------------------------

/// Write call received by [`FakeSourceHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    CreatePullRequest {
        repo: String,
        title: String,
        head: String,
        base: String,
    },
    AddLabels {
        repo: String,
        number: u64,
        labels: Vec<String>,
    },
    Merge {
        repo: String,
        number: u64,
    },
}

#[derive(Debug, Default)]
struct SourceState {
    repositories: Vec<ManagedRepository>,
    /// Pull requests per full name, in creation order.
    pulls: HashMap<String, Vec<PromotionRequest>>,
    branches: HashMap<(String, String), String>,
    calls: Vec<SourceCall>,
    fail_writes_for: Option<String>,
}

/// In-memory GitHub stand-in.
#[derive(Debug, Default)]
pub struct FakeSourceHost {
    state: Mutex<SourceState>,
}

impl FakeSourceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repository(&self, repo: ManagedRepository) {
        self.state.lock().unwrap().repositories.push(repo);
    }

    /// Add a pull request; later additions are treated as newer.
    pub fn add_pull_request(&self, repo: &str, pr: PromotionRequest) {
        let mut state = self.state.lock().unwrap();
        state
            .pulls
            .entry(format!("moxionio/{repo}"))
            .or_default()
            .push(pr);
    }

    pub fn set_branch_head(&self, repo: &str, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert((format!("moxionio/{repo}"), branch.to_string()), sha.to_string());
    }

    /// Make every write against `repo` fail with a transport error.
    pub fn fail_writes_for(&self, repo: &str) {
        self.state.lock().unwrap().fail_writes_for = Some(format!("moxionio/{repo}"));
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn pull_requests(&self, repo: &str) -> Vec<PromotionRequest> {
        self.state
            .lock()
            .unwrap()
            .pulls
            .get(&format!("moxionio/{repo}"))
            .cloned()
            .unwrap_or_default()
    }

    fn check_write(state: &SourceState, full_name: &str) -> Result<()> {
        if state.fail_writes_for.as_deref() == Some(full_name) {
            return Err(ReleaseError::transport("github", "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceHost for FakeSourceHost {
    async fn search_repositories(
        &self,
        query: &RepositoryQuery,
    ) -> Result<Vec<ManagedRepository>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .repositories
            .iter()
            .filter(|r| r.full_name.starts_with(&format!("{}/", query.org)))
            .filter(|r| r.has_topic(&query.topic))
            .cloned()
            .collect())
    }

    async fn repository(&self, full_name: &str) -> Result<ManagedRepository> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .iter()
            .find(|r| r.full_name == full_name)
            .cloned()
            .ok_or_else(|| ReleaseError::not_found("repository", full_name))
    }

    async fn list_pull_requests(
        &self,
        repo: &ManagedRepository,
        query: &PullRequestQuery,
    ) -> Result<Vec<PromotionRequest>> {
        let state = self.state.lock().unwrap();
        let pulls = state.pulls.get(&repo.full_name).cloned().unwrap_or_default();
        Ok(pulls
            .into_iter()
            .rev()
            .filter(|pr| match query.state {
                StateFilter::Open => {
                    matches!(pr.state, PullRequestState::Open | PullRequestState::Draft)
                }
                StateFilter::All => true,
            })
            .filter(|pr| query.base.as_deref().map_or(true, |b| pr.base == b))
            .map(|mut pr| {
                // The list endpoint does not compute mergeability.
                pr.mergeable = None;
                pr
            })
            .collect())
    }

    async fn pull_request(
        &self,
        repo: &ManagedRepository,
        number: u64,
    ) -> Result<PromotionRequest> {
        let state = self.state.lock().unwrap();
        state
            .pulls
            .get(&repo.full_name)
            .and_then(|prs| prs.iter().find(|pr| pr.number == number))
            .cloned()
            .ok_or_else(|| {
                ReleaseError::not_found("pull request", format!("{}#{number}", repo.full_name))
            })
    }

    async fn create_pull_request(
        &self,
        repo: &ManagedRepository,
        request: &NewPullRequest,
    ) -> Result<PromotionRequest> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&state, &repo.full_name)?;
        state.calls.push(SourceCall::CreatePullRequest {
            repo: repo.name.clone(),
            title: request.title.clone(),
            head: request.head.clone(),
            base: request.base.clone(),
        });
        let prs = state.pulls.entry(repo.full_name.clone()).or_default();
        let number = prs.iter().map(|pr| pr.number).max().unwrap_or(0) + 1;
        let pr = PromotionRequest {
            number,
            title: request.title.clone(),
            url: format!("{}/pull/{number}", repo.html_url),
            head: request.head.clone(),
            base: request.base.clone(),
            labels: Vec::new(),
            state: PullRequestState::Open,
            mergeable: Some(true),
        };
        prs.push(pr.clone());
        Ok(pr)
    }

    async fn add_labels(
        &self,
        repo: &ManagedRepository,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&state, &repo.full_name)?;
        state.calls.push(SourceCall::AddLabels {
            repo: repo.name.clone(),
            number,
            labels: labels.to_vec(),
        });
        if let Some(pr) = state
            .pulls
            .get_mut(&repo.full_name)
            .and_then(|prs| prs.iter_mut().find(|pr| pr.number == number))
        {
            pr.labels.extend(labels.iter().cloned());
        }
        Ok(())
    }

    async fn merge_pull_request(&self, repo: &ManagedRepository, number: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_write(&state, &repo.full_name)?;
        state.calls.push(SourceCall::Merge {
            repo: repo.name.clone(),
            number,
        });
        if let Some(pr) = state
            .pulls
            .get_mut(&repo.full_name)
            .and_then(|prs| prs.iter_mut().find(|pr| pr.number == number))
        {
            pr.state = PullRequestState::Merged;
        }
        Ok(())
    }

    async fn branch_head(&self, repo: &ManagedRepository, branch: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .branches
            .get(&(repo.full_name.clone(), branch.to_string()))
            .cloned()
            .ok_or_else(|| {
                ReleaseError::not_found("branch", format!("{}@{branch}", repo.full_name))
            })
    }
}

// ---------------------------------------------------------------------------
// FakePipelineProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PipelineState {
    pipelines: Vec<PipelineDefinition>,
    executions: HashMap<String, PipelineExecutionRecord>,
    roles_used: Vec<Role>,
}

/// In-memory CodePipeline stand-in.
#[derive(Debug, Default)]
pub struct FakePipelineProvider {
    state: Mutex<PipelineState>,
}

impl FakePipelineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pipeline(&self, definition: PipelineDefinition) {
        self.state.lock().unwrap().pipelines.push(definition);
    }

    pub fn set_latest_execution(&self, pipeline: &str, execution: PipelineExecutionRecord) {
        self.state
            .lock()
            .unwrap()
            .executions
            .insert(pipeline.to_string(), execution);
    }

    /// Roles of the credentials presented, one entry per call.
    pub fn roles_used(&self) -> Vec<Role> {
        self.state.lock().unwrap().roles_used.clone()
    }
}

#[async_trait]
impl PipelineProvider for FakePipelineProvider {
    async fn list_pipelines(&self, credential: &SessionCredential) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.roles_used.push(credential.role);
        Ok(state.pipelines.iter().map(|p| p.name.clone()).collect())
    }

    async fn get_pipeline(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<PipelineDefinition> {
        let mut state = self.state.lock().unwrap();
        state.roles_used.push(credential.role);
        state
            .pipelines
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| ReleaseError::not_found("pipeline", name))
    }

    async fn latest_execution(
        &self,
        credential: &SessionCredential,
        name: &str,
    ) -> Result<Option<PipelineExecutionRecord>> {
        let mut state = self.state.lock().unwrap();
        state.roles_used.push(credential.role);
        Ok(state.executions.get(name).cloned())
    }
}

// ---------------------------------------------------------------------------
// FakePromotionHost
// ---------------------------------------------------------------------------

/// Call received by [`FakePromotionHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionCall {
    Create {
        role: Role,
        repository: String,
        branches: BranchPair,
        title: String,
    },
    MergeFastForward {
        role: Role,
        repository: String,
        pull_request_id: String,
    },
}

#[derive(Debug, Default)]
struct PromotionState {
    calls: Vec<PromotionCall>,
    next_id: u64,
    fail_on: Option<BranchPair>,
}

/// In-memory CodeCommit stand-in.
#[derive(Debug, Default)]
pub struct FakePromotionHost {
    state: Mutex<PromotionState>,
}

impl FakePromotionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail pull-request creation for `branches` with a transport error.
    pub fn fail_on(&self, branches: BranchPair) {
        self.state.lock().unwrap().fail_on = Some(branches);
    }

    pub fn calls(&self) -> Vec<PromotionCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl PromotionHost for FakePromotionHost {
    async fn create_pull_request(
        &self,
        credential: &SessionCredential,
        repository: &str,
        branches: &BranchPair,
        title: &str,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on.as_ref() == Some(branches) {
            return Err(ReleaseError::transport("codecommit", "injected failure"));
        }
        state.calls.push(PromotionCall::Create {
            role: credential.role,
            repository: repository.to_string(),
            branches: branches.clone(),
            title: title.to_string(),
        });
        state.next_id += 1;
        Ok(state.next_id.to_string())
    }

    async fn merge_fast_forward(
        &self,
        credential: &SessionCredential,
        repository: &str,
        pull_request_id: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(PromotionCall::MergeFastForward {
            role: credential.role,
            repository: repository.to_string(),
            pull_request_id: pull_request_id.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeIdentityBroker
// ---------------------------------------------------------------------------

/// STS stand-in that accepts exactly one MFA code.
#[derive(Debug)]
pub struct FakeIdentityBroker {
    accepted_code: String,
    assumed: Mutex<Vec<(Role, String)>>,
}

impl FakeIdentityBroker {
    pub fn accepting(code: &str) -> Self {
        Self {
            accepted_code: code.to_string(),
            assumed: Mutex::new(Vec::new()),
        }
    }

    /// `(role, session name)` for every successful assume call.
    pub fn assumed(&self) -> Vec<(Role, String)> {
        self.assumed.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityBroker for FakeIdentityBroker {
    async fn assume_role(
        &self,
        role: Role,
        profile: &RoleProfile,
        code: &MfaCode,
    ) -> Result<SessionCredential> {
        profile.assume_parameters()?;
        if code.secret().expose_secret() != self.accepted_code {
            return Err(ReleaseError::Authentication(
                "MultiFactorAuthentication failed with invalid MFA one time pass code".to_string(),
            ));
        }
        self.assumed
            .lock()
            .unwrap()
            .push((role, profile.session_name.clone()));
        Ok(SessionCredential::new(
            role,
            format!("ASIA{}", role.to_string().to_uppercase()),
            "fake-secret",
            "fake-token",
            None,
        ))
    }
}

/// A credential for `role` without going through a broker.
pub fn credential(role: Role) -> SessionCredential {
    SessionCredential::new(role, "ASIAFAKE", "fake-secret", "fake-token", None)
}
