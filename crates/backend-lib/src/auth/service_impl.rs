use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use portfolio_common::Role;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{AuthError, AuthService, AuthenticatedUser, Encryptor};
use crate::config::SeedUser;
use crate::metrics::{USER_CREATED, USER_LOGIN_FAILED, USER_LOGIN_OK};
use crate::storage::Gateway;

/// Auth service backed by the `users` table
pub struct DefaultAuth {
    gateway: Arc<dyn Gateway>,
    encryptor: Encryptor,
}

impl DefaultAuth {
    pub fn new(gateway: Arc<dyn Gateway>, encryptor: Encryptor) -> Self {
        Self { gateway, encryptor }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        name: &str,
    ) -> Result<(), AuthError> {
        let existing = self
            .gateway
            .execute("SELECT email FROM users WHERE email = ?", &[email.into()])
            .await?;
        if !existing.is_empty() {
            return Err(AuthError::AlreadyExists);
        }

        let digest = self.encryptor.oneway(password)?;
        self.gateway
            .execute(
                "INSERT INTO users (email, password, role, name) VALUES (?, ?, ?, ?)",
                &[email.into(), digest.into(), role.as_str().into(), name.into()],
            )
            .await?;

        counter!(USER_CREATED).increment(1);
        info!(%role, "created user");
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let rows = self
            .gateway
            .execute(
                "SELECT password, role, name FROM users WHERE email = ?",
                &[email.into()],
            )
            .await?;

        let row = rows.first().filter(|row| {
            row.get("password")
                .and_then(Value::as_str)
                .is_some_and(|stored| self.encryptor.verify(stored, password))
        });
        let Some(row) = row else {
            counter!(USER_LOGIN_FAILED).increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        counter!(USER_LOGIN_OK).increment(1);
        Ok(AuthenticatedUser {
            email: email.to_string(),
            role: row.get("role").and_then(Value::as_str).map_or(Role::Other, Role::from),
            name: row
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Create the start-up accounts, ignoring ones that already exist
pub async fn seed_accounts(auth: &dyn AuthService, users: &[SeedUser]) -> usize {
    let mut created = 0;
    for user in users {
        match auth
            .create_user(&user.email, &user.password, Role::from(user.role.as_str()), &user.name)
            .await
        {
            Ok(()) => created += 1,
            Err(AuthError::AlreadyExists) => {},
            Err(e) => warn!(error = %e, "failed to create seed account"),
        }
    }
    created
}
