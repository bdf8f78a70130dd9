//! Role-scoped, short-lived session credentials.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The two roles a run may assume. Credentials for one are never used for the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Release repository operations (CodeCommit promotions).
    Shared,
    /// Artifact and pipeline reads (CodePipeline).
    Artifacts,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Shared => f.write_str("shared"),
            Role::Artifacts => f.write_str("artifacts"),
        }
    }
}

/// Temporary credentials minted by the identity broker for a single role.
///
/// Secret material stays wrapped in [`SecretString`], so `Debug` output is
/// redacted.
#[derive(Debug)]
pub struct SessionCredential {
    pub role: Role,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionCredential {
    pub fn new(
        role: Role,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            role,
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            session_token: SecretString::from(session_token.into()),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// MFA one-time code supplied interactively by the operator.
#[derive(Debug)]
pub struct MfaCode(SecretString);

impl MfaCode {
    pub fn new(code: impl Into<String>) -> crate::domain::Result<Self> {
        let code = code.into();
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::domain::ReleaseError::InvalidInput(
                "MFA code must be a non-empty string of digits".to_string(),
            ));
        }
        Ok(Self(SecretString::from(code.to_string())))
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }
}
