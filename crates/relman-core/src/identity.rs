//! Role assumption for a run.

use tracing::info;

use crate::config::AwsSettings;
use crate::domain::{MfaCode, ReleaseError, Result, Role, SessionCredential};
use crate::ports::IdentityBroker;

/// Assume `role` with the operator's MFA code.
///
/// The returned credential is checked to be scoped to `role`; a broker that
/// hands back a credential for the other role is treated as an
/// authentication failure.
pub async fn assume_role(
    broker: &dyn IdentityBroker,
    aws: &AwsSettings,
    role: Role,
    code: &MfaCode,
) -> Result<SessionCredential> {
    let profile = aws.role(role);
    info!(%role, profile = %profile.profile, "assuming role");
    let credential = broker.assume_role(role, profile, code).await?;
    if credential.role != role {
        return Err(ReleaseError::Authentication(format!(
            "requested {role} credentials but received {}",
            credential.role
        )));
    }
    Ok(credential)
}
