/// JWT issuing and validation for the posts platform
///
/// Tokens are signed with RS256 (RSA with SHA-256) and carry everything needed to
/// build a caller identity without a storage lookup: user id, display name and role.
///
/// ## Security Design
///
/// - **RS256 ONLY**: No symmetric algorithms to prevent algorithm confusion attacks
/// - **No hardcoded keys**: Keys are handed in as PEM strings by the caller
/// - **Validation-only mode**: Services that never mint tokens hold only the public key
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwt::{JwtKeys, Role};
/// use uuid::Uuid;
///
/// let private_key = std::env::var("JWT_PRIVATE_KEY_PEM").unwrap();
/// let public_key = std::env::var("JWT_PUBLIC_KEY_PEM").unwrap();
/// let keys = JwtKeys::from_pem(&private_key, &public_key).unwrap();
///
/// let token = keys.generate_access_token(Uuid::new_v4(), "alice", Role::Normal).unwrap();
/// let claims = keys.validate_token(&token).unwrap();
/// assert_eq!(claims.name, "alice");
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;

/// JWT algorithm - MUST be RS256
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

pub const ACCESS_TOKEN_TYPE: &str = "access";

// ============================================================================
// Data Structures
// ============================================================================

/// Caller role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Normal,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Normal => write!(f, "NORMAL"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// JWT Claims structure - standard claims plus identity fields
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, only "access" is accepted by API callers
    pub token_type: String,
    /// Display name
    pub name: String,
    /// Caller role
    pub role: Role,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| JwtError::Invalid(format!("invalid user ID format in token: {e}")))
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("signing key not configured")]
    SigningKeyMissing,

    #[error("failed to parse key: {0}")]
    KeyParse(String),

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

// ============================================================================
// Key Storage
// ============================================================================

/// RS256 key material
///
/// The encoding key is optional: services that only validate tokens are built
/// with [`JwtKeys::validation_only`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("can_sign", &self.encoding.is_some())
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from PEM-formatted RSA private and public keys
    pub fn from_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self, JwtError> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::KeyParse(format!("RSA private key: {e}")))?;
        let mut keys = Self::validation_only(public_key_pem)?;
        keys.encoding = Some(encoding);
        Ok(keys)
    }

    /// Build keys that can validate but never sign
    pub fn validation_only(public_key_pem: &str) -> Result<Self, JwtError> {
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::KeyParse(format!("RSA public key: {e}")))?;
        Ok(Self {
            encoding: None,
            decoding,
        })
    }

    pub fn can_sign(&self) -> bool {
        self.encoding.is_some()
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Generate a new access token (1 hour lifetime)
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        name: &str,
        role: Role,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiry = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            name: name.to_string(),
            role,
        };

        self.encode_claims(&claims)
    }

    /// Sign arbitrary claims
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        let encoding_key = self.encoding.as_ref().ok_or(JwtError::SigningKeyMissing)?;
        encode(&Header::new(JWT_ALGORITHM), claims, encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Validate and decode a token
    ///
    /// Verifies the RS256 signature and expiry. Tokens of any other type than
    /// `access` are rejected.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            tracing::debug!(token_type = %data.claims.token_type, "rejected non-access token");
            return Err(JwtError::Invalid(format!(
                "unexpected token type: {}",
                data.claims.token_type
            )));
        }

        Ok(data.claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
