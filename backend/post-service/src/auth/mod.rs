/// Identity resolution
///
/// Turns an opaque credential into an [`Identity`]. Signature and expiry checks
/// are delegated to a [`CredentialVerifier`].
pub mod jwt;
pub mod password;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::domain::Identity;
use crate::error::{ServiceError, ServiceResult};

pub use jwt::JwtCredentialVerifier;
pub use password::{Argon2PasswordHasher, PasswordHasher};

/// Verifies a raw credential
///
/// `Ok(None)` means the credential was rejected. `Err` is reserved for
/// infrastructure failures of the verifier itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_credential(&self, token: &str) -> anyhow::Result<Option<Identity>>;
}

/// Drop a leading `Bearer` scheme, matched case-insensitively
fn strip_bearer(credential: &str) -> &str {
    let (scheme, rest) = credential
        .split_once(char::is_whitespace)
        .unwrap_or((credential, ""));
    if scheme.eq_ignore_ascii_case("bearer") {
        rest.trim()
    } else {
        credential
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn CredentialVerifier>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolve a credential, accepting an optional `Bearer ` prefix
    pub async fn resolve(&self, credential: Option<&str>) -> ServiceResult<Identity> {
        let token = credential
            .map(str::trim)
            .map(strip_bearer)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized("missing credential".to_string()))?;

        match self.verifier.verify_credential(token).await? {
            Some(identity) => Ok(identity),
            None => {
                debug!("credential rejected by verifier");
                Err(ServiceError::Unauthorized("invalid credential".to_string()))
            }
        }
    }
}
