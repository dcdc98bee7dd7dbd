use async_trait::async_trait;
use portfolio_common::{AuthOutcome, Role};
use thiserror::Error;

use super::CryptoError;
use crate::storage::StoreError;

/// Why an auth operation did not succeed
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("encryption failure: {0}")]
    Crypto(#[from] CryptoError),
}

impl AuthError {
    /// Failure outcome safe to hand back to the browser
    pub fn outcome(&self) -> AuthOutcome {
        match self {
            AuthError::AlreadyExists | AuthError::InvalidCredentials => {
                AuthOutcome::failed(self.to_string())
            },
            AuthError::Storage(_) | AuthError::Crypto(_) => {
                AuthOutcome::failed("Unable to process request, please try again later")
            },
        }
    }
}

/// A user whose credentials checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub role: Role,
    pub name: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Insert a new user; fails with `AlreadyExists` when the email is taken
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        name: &str,
    ) -> Result<(), AuthError>;

    /// Check an email/password pair against the stored hash
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError>;
}
