//! The token-verifier capability
//!
//! Listener authentication is delegated: the endpoint hands the bearer
//! token to a [`TokenVerifier`] and gets back the caller's identity. The
//! production implementation lives with whatever identity system fronts
//! the deployment; [`StaticTokenVerifier`] serves tests and development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use logtap_core::UserInfo;

/// Verifies listener tokens. May block on the network.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserInfo, VerifyError>;
}

/// Errors from token verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The token did not map to an identity.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The verifier backend failed.
    #[error("token verification failed: {0}")]
    Backend(String),
}

/// A fixed token-to-identity map.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: RwLock<HashMap<String, UserInfo>>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, user: UserInfo) {
        self.tokens.write().insert(token.into(), user);
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserInfo, VerifyError> {
        self.tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(VerifyError::Unauthenticated)
    }
}
