//! Shared fixtures for post-service integration tests
//!
//! Wires the real JWT verifier, the argon2 hasher and the in-memory gateways
//! together so tests go through the same path a request does:
//! credential -> identity -> service.
#![allow(dead_code)]

use std::sync::Arc;

use crypto_core::jwt::{JwtKeys, Role};
use post_service::auth::{Argon2PasswordHasher, IdentityResolver, JwtCredentialVerifier};
use post_service::domain::Identity;
use post_service::repository::{InMemoryPostGateway, InMemoryUserGateway};
use post_service::{PostService, UserService};
use uuid::Uuid;

// Test RSA key pair - FOR TESTING ONLY
const TEST_PRIVATE_KEY: &str =
    include_str!("../../../libs/crypto-core/tests/fixtures/test_private_key.pem");
const TEST_PUBLIC_KEY: &str =
    include_str!("../../../libs/crypto-core/tests/fixtures/test_public_key.pem");

pub struct TestApp {
    pub gateway: InMemoryPostGateway,
    pub service: PostService,
    pub user_gateway: InMemoryUserGateway,
    pub users: UserService,
    pub resolver: IdentityResolver,
    signer: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        let signer = JwtKeys::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).expect("test keys");
        let verifier = JwtKeys::validation_only(TEST_PUBLIC_KEY).expect("test public key");

        let gateway = InMemoryPostGateway::new();
        let user_gateway = InMemoryUserGateway::new();
        Self {
            service: PostService::new(Arc::new(gateway.clone())),
            users: UserService::new(
                Arc::new(user_gateway.clone()),
                Arc::new(Argon2PasswordHasher::new()),
                signer.clone(),
            ),
            user_gateway,
            resolver: IdentityResolver::new(Arc::new(JwtCredentialVerifier::new(verifier))),
            gateway,
            signer,
        }
    }

    /// Mint a token for a fresh user
    pub fn token_for(&self, name: &str, role: Role) -> String {
        self.signer
            .generate_access_token(Uuid::new_v4(), name, role)
            .expect("token minted")
    }

    /// Mint a token and resolve it the way a request would
    pub async fn login(&self, name: &str, role: Role) -> Identity {
        let token = self.token_for(name, role);
        self.resolver
            .resolve(Some(&format!("Bearer {token}")))
            .await
            .expect("identity resolved")
    }
}
