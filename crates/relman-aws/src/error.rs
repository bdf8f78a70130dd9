//! Error types for relman-aws

use relman_core::ReleaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    /// STS refused the assume-role call (bad MFA code, untrusted role, ...)
    #[error("assume role failed: {0}")]
    AssumeRole(String),

    /// Shared AWS config/credentials files could not be loaded
    #[error("failed to load AWS profiles: {0}")]
    Profile(String),

    /// A credential expired before the call was made
    #[error("{role} session credential expired, rerun to authenticate again")]
    Expired { role: String },

    /// A service call failed
    #[error("{service} call failed: {detail}")]
    Service {
        service: &'static str,
        detail: String,
    },

    /// A response was missing a field relman depends on
    #[error("{service} response missing {field}")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },

    /// A request could not be built
    #[error("invalid request: {0}")]
    Request(String),
}

impl AwsError {
    pub fn service(service: &'static str, detail: impl std::fmt::Display) -> Self {
        AwsError::Service {
            service,
            detail: detail.to_string(),
        }
    }
}

impl From<AwsError> for ReleaseError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::AssumeRole(_) | AwsError::Profile(_) | AwsError::Expired { .. } => {
                ReleaseError::Authentication(err.to_string())
            }
            AwsError::Service { service, detail } => ReleaseError::transport(service, detail),
            AwsError::MissingField { service, .. } => ReleaseError::transport(service, err),
            AwsError::Request(_) => ReleaseError::InvalidInput(err.to_string()),
        }
    }
}
