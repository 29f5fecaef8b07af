/// RS256 JWT verifier backed by crypto-core
use async_trait::async_trait;
use crypto_core::jwt::{JwtError, JwtKeys};
use tracing::debug;

use super::CredentialVerifier;
use crate::config::JwtConfig;
use crate::domain::Identity;

#[derive(Debug, Clone)]
pub struct JwtCredentialVerifier {
    keys: JwtKeys,
}

impl JwtCredentialVerifier {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }

    /// Validation-only verifier from configuration
    pub fn from_config(config: &JwtConfig) -> anyhow::Result<Self> {
        let keys = JwtKeys::validation_only(&config.public_key_pem)
            .map_err(|e| anyhow::anyhow!("Failed to load JWT public key: {e}"))?;
        Ok(Self::new(keys))
    }
}

#[async_trait]
impl CredentialVerifier for JwtCredentialVerifier {
    async fn verify_credential(&self, token: &str) -> anyhow::Result<Option<Identity>> {
        let claims = match self.keys.validate_token(token) {
            Ok(claims) => claims,
            Err(JwtError::Expired) => {
                debug!("token expired");
                return Ok(None);
            }
            Err(JwtError::Invalid(reason)) => {
                debug!(%reason, "token invalid");
                return Ok(None);
            }
            Err(e) => return Err(anyhow::anyhow!(e)),
        };

        let id = match claims.user_id() {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "token subject is not a user id");
                return Ok(None);
            }
        };

        Ok(Some(Identity {
            id,
            display_name: claims.name,
            role: claims.role,
        }))
    }
}
