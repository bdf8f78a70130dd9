//! Static credentials built from a [`SessionCredential`].
//!
//! Service clients are created per call from the credential passed in, so no
//! client outlives the operation that needed it.

use std::time::{Duration, SystemTime};

use aws_credential_types::Credentials;
use chrono::Utc;
use relman_core::SessionCredential;
use secrecy::ExposeSecret;

use crate::error::AwsError;

/// Provider name reported by the SDK for relman-minted credentials.
pub const PROVIDER_NAME: &str = "relman";

/// Reject a credential that has already expired, so no client is built
/// from it.
pub fn ensure_fresh(credential: &SessionCredential) -> Result<(), AwsError> {
    if credential.is_expired_at(Utc::now()) {
        return Err(AwsError::Expired {
            role: credential.role.to_string(),
        });
    }
    Ok(())
}

pub fn static_credentials(credential: &SessionCredential) -> Credentials {
    let expiry = credential
        .expires_at
        .and_then(|at| u64::try_from(at.timestamp()).ok())
        .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
    Credentials::new(
        credential.access_key_id.clone(),
        credential.secret_access_key.expose_secret().to_string(),
        Some(credential.session_token.expose_secret().to_string()),
        expiry,
        PROVIDER_NAME,
    )
}

/// Smithy getters return `&T` for required members and `Option<&T>` for
/// optional ones; this accepts either.
pub(crate) fn opt<'a, T: ?Sized>(value: impl Into<Option<&'a T>>) -> Option<&'a T> {
    value.into()
}
