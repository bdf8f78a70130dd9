//! GitHub client configuration.

use secrecy::SecretString;

use crate::error::GitHubError;

/// Token variables, in lookup order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GITHUB_OAUTH"];

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// API base URL, e.g. `https://api.github.com`
    pub api_url: String,
    pub token: SecretString,
    /// Items per page for list and search calls (max 100)
    pub page_size: u32,
    pub user_agent: String,
}

impl GitHubClientConfig {
    pub fn new(api_url: &str, token: SecretString, page_size: u32) -> Self {
        GitHubClientConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            page_size: page_size.clamp(1, 100),
            user_agent: format!("relman/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Read the token from `GITHUB_TOKEN`, falling back to `GITHUB_OAUTH`.
    pub fn from_env(api_url: &str, page_size: u32) -> Result<Self, GitHubError> {
        Self::from_lookup(api_url, page_size, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        api_url: &str,
        page_size: u32,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GitHubError> {
        let token = TOKEN_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .ok_or(GitHubError::MissingToken)?;
        Ok(Self::new(api_url, SecretString::from(token), page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_token_falls_back_to_oauth() {
        let config = GitHubClientConfig::from_lookup("https://api.github.com/", 100, |key| {
            (key == "GITHUB_OAUTH").then(|| "gho_fallback".to_string())
        })
        .unwrap();
        assert_eq!(config.token.expose_secret(), "gho_fallback");
        assert_eq!(config.api_url, "https://api.github.com");
    }

    #[test]
    fn test_primary_token_preferred() {
        let config = GitHubClientConfig::from_lookup("https://api.github.com", 100, |key| {
            Some(format!("{key}-value"))
        })
        .unwrap();
        assert_eq!(config.token.expose_secret(), "GITHUB_TOKEN-value");
    }

    #[test]
    fn test_missing_token() {
        let err = GitHubClientConfig::from_lookup("https://api.github.com", 100, |_| None)
            .unwrap_err();
        assert!(matches!(err, GitHubError::MissingToken));
    }

    #[test]
    fn test_page_size_clamped() {
        let config = GitHubClientConfig::new(
            "https://api.github.com",
            SecretString::from("t".to_string()),
            500,
        );
        assert_eq!(config.page_size, 100);
    }
}
