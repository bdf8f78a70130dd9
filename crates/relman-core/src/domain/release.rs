//! Release identity, branch pairs and promotion chains.

use serde::{Deserialize, Serialize};

use super::error::{ReleaseError, Result};

/// External ticket id that correlates every pull request of one release.
///
/// Attached verbatim as a label, so it is compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ReleaseError::InvalidInput(
                "release id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title used for every pull request opened on behalf of this release.
    pub fn pull_request_title(&self) -> String {
        format!("Production Release {}", self.0)
    }
}

impl std::fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ReleaseId {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Source and destination branch of a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPair {
    pub source: String,
    pub destination: String,
}

impl BranchPair {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for BranchPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Which environment chain a deploy promotes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployTarget {
    /// UAT and OA-QA: `stage -> uat`, then `uat -> oa`.
    Uat,
    /// Production: `uat -> prod`.
    Production,
}

impl DeployTarget {
    /// Ordered branch promotions for this target.
    pub fn chain(self) -> Vec<BranchPair> {
        match self {
            DeployTarget::Uat => vec![
                BranchPair::new("stage", "uat"),
                BranchPair::new("uat", "oa"),
            ],
            DeployTarget::Production => vec![BranchPair::new("uat", "prod")],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeployTarget::Uat => "UAT/OA-QA",
            DeployTarget::Production => "production",
        }
    }
}
