//! Error types for relman-github

use relman_core::ReleaseError;
use thiserror::Error;

/// Errors that can occur talking to the GitHub REST API
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Neither `GITHUB_TOKEN` nor `GITHUB_OAUTH` is set
    #[error("no GitHub token found, set GITHUB_TOKEN or GITHUB_OAUTH")]
    MissingToken,

    /// Token rejected by the API (401/403)
    #[error("GitHub rejected the token ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Resource does not exist (404)
    #[error("{0} not found on GitHub")]
    NotFound(String),

    /// Any other non-success status
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request could not be sent or the response not read
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<GitHubError> for ReleaseError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::MissingToken | GitHubError::Unauthorized { .. } => {
                ReleaseError::Authentication(err.to_string())
            }
            GitHubError::NotFound(name) => ReleaseError::not_found("github resource", name),
            other => ReleaseError::transport("github", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_authentication() {
        let err: ReleaseError = GitHubError::MissingToken.into();
        assert!(matches!(err, ReleaseError::Authentication(_)));

        let err: ReleaseError = GitHubError::Unauthorized {
            status: 401,
            message: "Bad credentials".to_string(),
        }
        .into();
        assert!(matches!(err, ReleaseError::Authentication(_)));
    }

    #[test]
    fn test_not_found_keeps_resource_name() {
        let err: ReleaseError = GitHubError::NotFound("moxionio/app-a".to_string()).into();
        assert!(err.to_string().contains("moxionio/app-a"));
    }

    #[test]
    fn test_api_error_is_transport() {
        let err: ReleaseError = GitHubError::Api {
            status: 422,
            message: "Validation Failed".to_string(),
        }
        .into();
        assert!(matches!(err, ReleaseError::Transport { system: "github", .. }));
    }
}
