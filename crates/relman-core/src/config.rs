//! Release configuration stored in `relman.toml`.
//!
//! Every field has a default that reproduces the standard Moxion release
//! process, so the file only needs to carry what differs (typically the
//! `[aws.roles.*]` tables with role ARNs and MFA serials).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ReleaseError, Result, Role, Visibility};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RELMAN_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "relman.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReleaseConfig {
    pub github: GitHubSettings,
    pub branches: BranchSettings,
    pub pipelines: PipelineSettings,
    pub aws: AwsSettings,
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_url: String,
    pub org: String,
    /// Topic that marks a repository as managed-release.
    pub topic: String,
    pub visibility: Visibility,
    pub page_size: u32,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            org: "moxionio".to_string(),
            topic: "managed-release".to_string(),
            visibility: Visibility::Private,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BranchSettings {
    /// Default head branch for release pull requests (`--base` overrides).
    pub base: String,
    pub production: String,
}

impl Default for BranchSettings {
    fn default() -> Self {
        Self {
            base: "stage".to_string(),
            production: "prod".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Lowercased pipeline names ending with this suffix are production pipelines.
    pub production_suffix: String,
    /// Action provider that identifies a GitHub source action.
    pub source_provider: String,
    /// Action configuration key holding the repository name.
    pub repository_key: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            production_suffix: "-prod".to_string(),
            source_provider: "GitHub".to_string(),
            repository_key: "Repo".to_string(),
        }
    }
}

/// One assumable role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleProfile {
    /// Named local profile this role corresponds to.
    pub profile: String,
    pub role_arn: Option<String>,
    pub mfa_serial: Option<String>,
    pub session_name: String,
}

impl RoleProfile {
    fn new(profile: &str, session_name: &str) -> Self {
        Self {
            profile: profile.to_string(),
            role_arn: None,
            mfa_serial: None,
            session_name: session_name.to_string(),
        }
    }

    /// Role ARN and MFA serial from `relman.toml` alone.
    pub fn assume_parameters(&self) -> Result<(String, String)> {
        self.resolve_parameters(|_| None)
    }

    /// Role ARN and MFA serial, taking values set here over those `lookup`
    /// finds in the named local profile (keys `role_arn` and `mfa_serial`).
    pub fn resolve_parameters(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(String, String)> {
        let pick = |configured: &Option<String>, key: &str| {
            configured
                .clone()
                .or_else(|| lookup(key))
                .filter(|s| !s.trim().is_empty())
        };
        match (pick(&self.role_arn, "role_arn"), pick(&self.mfa_serial, "mfa_serial")) {
            (Some(arn), Some(serial)) => Ok((arn, serial)),
            (None, _) => Err(ReleaseError::Authentication(format!(
                "profile '{}' has no role_arn configured",
                self.profile
            ))),
            (_, None) => Err(ReleaseError::Authentication(format!(
                "profile '{}' has no mfa_serial configured",
                self.profile
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoleSettings {
    pub shared: RoleProfile,
    pub artifacts: RoleProfile,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            shared: RoleProfile::new("moxion-shared-admin", "moxion-release-shared"),
            artifacts: RoleProfile::new("moxion-artifact-admin", "moxion-release-artifacts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AwsSettings {
    pub region: String,
    /// Profile whose long-lived credentials call STS.
    pub identity_profile: String,
    pub roles: RoleSettings,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            identity_profile: "moxion-identity".to_string(),
            roles: RoleSettings::default(),
        }
    }
}

impl AwsSettings {
    pub fn role(&self, role: Role) -> &RoleProfile {
        match role {
            Role::Shared => &self.roles.shared,
            Role::Artifacts => &self.roles.artifacts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeploySettings {
    /// CodeCommit repository on which environment promotions are opened.
    pub repository: String,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            repository: "moxion_application".to_string(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            github: GitHubSettings::default(),
            branches: BranchSettings::default(),
            pipelines: PipelineSettings::default(),
            aws: AwsSettings::default(),
            deploy: DeploySettings::default(),
        }
    }
}

impl ReleaseConfig {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("github.api_url", &self.github.api_url),
            ("github.org", &self.github.org),
            ("github.topic", &self.github.topic),
            ("branches.base", &self.branches.base),
            ("branches.production", &self.branches.production),
            ("pipelines.production_suffix", &self.pipelines.production_suffix),
            ("pipelines.source_provider", &self.pipelines.source_provider),
            ("pipelines.repository_key", &self.pipelines.repository_key),
            ("aws.region", &self.aws.region),
            ("aws.identity_profile", &self.aws.identity_profile),
            ("deploy.repository", &self.deploy.repository),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ReleaseError::Config(format!("{field} must not be empty")));
            }
        }
        if self.github.page_size == 0 || self.github.page_size > 100 {
            return Err(ReleaseError::Config(
                "github.page_size must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `RELMAN_*` / `GITHUB_API_URL` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(org) = lookup("RELMAN_GITHUB_ORG") {
            self.github.org = org;
        }
        if let Some(url) = lookup("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(region) = lookup("RELMAN_AWS_REGION") {
            self.aws.region = region;
        }
    }
}

/// Parse a config file from TOML.
pub fn load_config(path: &Path) -> Result<ReleaseConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ReleaseError::Config(format!("failed to read {}: {e}", path.display())))?;
    let config: ReleaseConfig = toml::from_str(&raw)
        .map_err(|e| ReleaseError::Config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Resolve and load configuration for a run.
///
/// An explicit path must exist. Otherwise `RELMAN_CONFIG` is consulted, then
/// `relman.toml` in the working directory; with neither present the defaults
/// are used. Environment overrides are applied last.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ReleaseConfig> {
    let candidate: Option<PathBuf> = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            }),
    };

    let mut config = match candidate {
        Some(path) => {
            debug!(path = %path.display(), "loading release config");
            load_config(&path)?
        }
        None => ReleaseConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
