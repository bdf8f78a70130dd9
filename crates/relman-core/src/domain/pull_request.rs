//! Pull requests that carry code between environment branches.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a promotion pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Draft,
    Merged,
    ClosedUnmerged,
}

/// Filter for listing pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Open,
    All,
}

/// A pull request on the source-control host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    /// Head branch (code moves from here).
    pub head: String,
    /// Base branch (code moves into here).
    pub base: String,
    pub labels: Vec<String>,
    pub state: PullRequestState,
    /// Host-computed mergeability; `None` while the host is still computing it.
    pub mergeable: Option<bool>,
}

impl PromotionRequest {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Parameters for opening a new pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}
