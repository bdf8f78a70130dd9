//! STS identity broker.

use std::borrow::Cow;

use async_trait::async_trait;
use aws_config::profile::profile_file::ProfileFiles;
use aws_config::profile::{self, ProfileSet};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use aws_types::os_shim_internal::{Env, Fs};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use relman_core::{IdentityBroker, MfaCode, Result, Role, RoleProfile, SessionCredential};

use crate::error::AwsError;

/// Assumes roles with MFA, authenticating the STS call with a named local
/// profile.
///
/// The role ARN and MFA serial of each role come from its profile in the
/// shared AWS config file (`AWS_CONFIG_FILE`, default `~/.aws/config`)
/// unless `relman.toml` sets them.
#[derive(Debug, Clone)]
pub struct StsIdentityBroker {
    identity_profile: String,
    region: String,
    env: Env,
    fs: Fs,
}

impl StsIdentityBroker {
    pub fn new(identity_profile: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            identity_profile: identity_profile.into(),
            region: region.into(),
            env: Env::real(),
            fs: Fs::real(),
        }
    }

    /// Resolve profile files against `env` instead of the process environment.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    async fn profiles(&self, selected: &str) -> std::result::Result<ProfileSet, AwsError> {
        profile::load(
            &self.fs,
            &self.env,
            &ProfileFiles::default(),
            Some(Cow::Owned(selected.to_string())),
        )
        .await
        .map_err(|e| AwsError::Profile(e.to_string()))
    }

    /// Role ARN and MFA serial for `profile`, overrides first.
    pub async fn assume_parameters(&self, profile: &RoleProfile) -> Result<(String, String)> {
        let profiles = self.profiles(&profile.profile).await?;
        let named = profiles.get_profile(&profile.profile);
        debug!(
            profile = %profile.profile,
            found = named.is_some(),
            "looked up role profile"
        );
        profile.resolve_parameters(|key| named.and_then(|p| p.get(key)).map(str::to_string))
    }

    async fn client(&self) -> aws_sdk_sts::Client {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&self.identity_profile)
            .region(Region::new(self.region.clone()))
            .load()
            .await;
        aws_sdk_sts::Client::new(&config)
    }
}

fn expiry(value: &aws_sdk_sts::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl IdentityBroker for StsIdentityBroker {
    async fn assume_role(
        &self,
        role: Role,
        profile: &RoleProfile,
        code: &MfaCode,
    ) -> Result<SessionCredential> {
        let (role_arn, mfa_serial) = self.assume_parameters(profile).await?;
        info!(
            %role,
            profile = %profile.profile,
            session = %profile.session_name,
            "calling sts assume-role"
        );

        let output = self
            .client()
            .await
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(&profile.session_name)
            .serial_number(mfa_serial)
            .token_code(code.secret().expose_secret())
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(_) => {
                    AwsError::AssumeRole(DisplayErrorContext(&err).to_string())
                }
                other => AwsError::service("sts", DisplayErrorContext(&other)),
            })?;

        let credentials = output.credentials().ok_or(AwsError::MissingField {
            service: "sts",
            field: "credentials",
        })?;
        Ok(SessionCredential::new(
            role,
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
            expiry(credentials.expiration()),
        ))
    }
}
