//! GitHub REST payloads and their conversion into relman domain types.
//!
//! Only the fields relman reads are declared; everything else in the
//! responses is ignored.

use relman_core::domain::{ManagedRepository, NewPullRequest, PromotionRequest, PullRequestState};
use serde::{Deserialize, Serialize};

/// `GET /search/repositories`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<RepositoryPayload>,
}

/// Repository as returned by search and by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub html_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl From<RepositoryPayload> for ManagedRepository {
    fn from(p: RepositoryPayload) -> Self {
        ManagedRepository {
            name: p.name,
            full_name: p.full_name,
            clone_url: p.clone_url,
            html_url: p.html_url,
            topics: p.topics,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefPayload {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// Pull request from the list or detail endpoint.
///
/// `merged` and `mergeable` are only present on the detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    pub merged_at: Option<String>,
    pub merged: Option<bool>,
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub labels: Vec<LabelPayload>,
    pub head: RefPayload,
    pub base: RefPayload,
}

impl PullRequestPayload {
    pub fn state(&self) -> PullRequestState {
        let merged = self.merged.unwrap_or(self.merged_at.is_some());
        if merged {
            PullRequestState::Merged
        } else if self.state == "closed" {
            PullRequestState::ClosedUnmerged
        } else if self.draft {
            PullRequestState::Draft
        } else {
            PullRequestState::Open
        }
    }
}

impl From<PullRequestPayload> for PromotionRequest {
    fn from(p: PullRequestPayload) -> Self {
        let state = p.state();
        PromotionRequest {
            number: p.number,
            title: p.title,
            url: p.html_url,
            head: p.head.ref_name,
            base: p.base.ref_name,
            labels: p.labels.into_iter().map(|l| l.name).collect(),
            state,
            mergeable: p.mergeable,
        }
    }
}

/// `POST /repos/{owner}/{repo}/pulls`
#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequestBody<'a> {
    pub title: &'a str,
    pub head: &'a str,
    pub base: &'a str,
    pub body: &'a str,
}

impl<'a> From<&'a NewPullRequest> for CreatePullRequestBody<'a> {
    fn from(r: &'a NewPullRequest) -> Self {
        Self {
            title: &r.title,
            head: &r.head,
            base: &r.base,
            body: &r.body,
        }
    }
}

/// `POST /repos/{owner}/{repo}/issues/{number}/labels`
#[derive(Debug, Clone, Serialize)]
pub struct AddLabelsBody<'a> {
    pub labels: &'a [String],
}

/// `PUT /repos/{owner}/{repo}/pulls/{number}/merge`
#[derive(Debug, Clone, Deserialize)]
pub struct MergeResponse {
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Clone, Deserialize)]
pub struct BranchPayload {
    pub name: String,
    pub commit: CommitPayload,
}
