//! Managed-release repositories as seen on the source-control host.

use serde::{Deserialize, Serialize};

/// A repository tagged to take part in the release process.
///
/// Discovered fresh on every run; never cached between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRepository {
    /// Short name, e.g. `app-a`.
    pub name: String,
    /// Owner-qualified name, e.g. `moxionio/app-a`.
    pub full_name: String,
    /// HTTP transport (clone) URL.
    pub clone_url: String,
    /// Browser URL.
    pub html_url: String,
    /// Topics attached to the repository.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl ManagedRepository {
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// Case-insensitive match against either the short name or the clone URL.
    pub fn matches_filter(&self, needle: &str) -> bool {
        needle.eq_ignore_ascii_case(&self.name) || needle.eq_ignore_ascii_case(&self.clone_url)
    }
}

/// Repository visibility used when searching the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ManagedRepository {
        ManagedRepository {
            name: "app-a".to_string(),
            full_name: "moxionio/app-a".to_string(),
            clone_url: "https://github.com/moxionio/app-a.git".to_string(),
            html_url: "https://github.com/moxionio/app-a".to_string(),
            topics: vec!["managed-release".to_string()],
        }
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        assert!(repo().matches_filter("APP-A"));
    }

    #[test]
    fn test_filter_matches_clone_url() {
        assert!(repo().matches_filter("https://GITHUB.com/moxionio/app-a.git"));
        assert!(!repo().matches_filter("https://github.com/moxionio/app-a"));
    }

    #[test]
    fn test_has_topic() {
        assert!(repo().has_topic("managed-release"));
        assert!(!repo().has_topic("Managed-Release"));
    }
}
