//! Hard-fault taxonomy for relman.
//!
//! Only faults that must stop a run live here. Validation outcomes such as an
//! unmerged pull request or a stale pipeline are soft failures and are carried
//! as [`crate::report::Outcome::Fail`] records instead.

use thiserror::Error;

/// Errors that abort a release command.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// MFA code rejected, role/profile misconfigured, or host token missing.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A resource the run depends on does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// An API call to an external system failed.
    #[error("{system} request failed: {detail}")]
    Transport {
        system: &'static str,
        detail: String,
    },

    /// Configuration file or values are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A value supplied by the operator is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleaseError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn transport(system: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Transport {
            system,
            detail: detail.to_string(),
        }
    }
}

/// Result type for relman operations.
pub type Result<T> = std::result::Result<T, ReleaseError>;
