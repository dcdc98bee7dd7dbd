// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login, logout and registration.
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::CookieJar;
use portfolio_common::{AuthOutcome, LoginForm, LoginReply, RegistrationForm, Role};
use serde::Deserialize;
use tracing::{info, warn};

use super::{expired_session_cookie, session_cookie, session_token};
use crate::auth::{AuthError, Session};
use crate::error::AppError;
use crate::AppState;

const DEFAULT_REDIRECT: &str = "/home";

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

impl NextParam {
    /// Only same-site paths are honoured
    fn target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
            _ => DEFAULT_REDIRECT,
        }
    }
}

/// `GET /`: forget the session and go home
pub async fn root(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session(&state, jar).await, Redirect::to(DEFAULT_REDIRECT))
}

/// `GET /logout`
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    (clear_session(&state, jar).await, Redirect::to("/"))
}

async fn clear_session(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(token) = session_token(&jar) {
        state.sessions.remove(&token).await;
    }
    jar.remove(expired_session_cookie())
}

/// `POST /processlogin`
///
/// On success the session is replaced by a fresh one holding the encrypted
/// email. On failure the session's failed-attempt counter goes up; there is
/// no lockout.
pub async fn process_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(next): Query<NextParam>,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<LoginReply>), AppError> {
    let token = session_token(&jar);

    match state.auth.authenticate(&form.email, &form.password).await {
        Ok(user) => {
            let encrypted = state.encryptor.encrypt(&user.email)?;
            if let Some(old) = &token {
                state.sessions.remove(old).await;
            }
            let token = state
                .sessions
                .create(Session::authenticated(encrypted, user.name, user.role))
                .await;

            info!(role = %user.role, "login succeeded");
            Ok((
                jar.add(session_cookie(token)),
                Json(LoginReply::accepted(next.target())),
            ))
        },
        Err(err) => {
            if !matches!(err, AuthError::InvalidCredentials) {
                warn!(error = %err, "login could not be checked");
            }

            let mut session = match &token {
                Some(token) => state.sessions.get(token).await.unwrap_or_default(),
                None => Session::default(),
            };
            session.failed_attempts += 1;
            let failed_attempts = session.failed_attempts;
            let token = state.sessions.save(token.as_deref(), session).await;

            let message = err.outcome().message.unwrap_or_default();
            Ok((
                jar.add(session_cookie(token)),
                Json(LoginReply::rejected(message, failed_attempts)),
            ))
        },
    }
}

/// `POST /processregister`: the raw creation outcome
pub async fn process_register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Json<AuthOutcome> {
    let role = Role::from(form.role.as_str());
    let outcome = match state
        .auth
        .create_user(&form.email, &form.password, role, &form.name)
        .await
    {
        Ok(()) => AuthOutcome::ok(),
        Err(err) => {
            if !matches!(err, AuthError::AlreadyExists) {
                warn!(error = %err, "registration failed");
            }
            err.outcome()
        },
    };
    Json(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(value: Option<&str>) -> NextParam {
        NextParam {
            next: value.map(str::to_string),
        }
    }

    #[test]
    fn redirect_target_is_local_path_only() {
        assert_eq!(next(Some("/chat")).target(), "/chat");
        assert_eq!(next(Some("https://elsewhere.example")).target(), "/home");
        assert_eq!(next(Some("//elsewhere.example")).target(), "/home");
        assert_eq!(next(None).target(), "/home");
    }
}
