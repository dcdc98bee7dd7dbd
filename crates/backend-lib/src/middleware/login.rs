use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::auth::Session;
use crate::handlers::session_token;
use crate::AppState;

/// The logged-in session, attached to gated requests
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub session: Session,
}

/// Only let requests with an authenticated session through.
///
/// Anyone else is sent to `/login?next=<path>`.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let current = match session_token(&jar) {
        Some(token) => state
            .sessions
            .get(&token)
            .await
            .filter(Session::is_authenticated)
            .map(|session| CurrentUser { token, session }),
        None => None,
    };

    match current {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        },
        None => {
            let path = request.uri().path();
            debug!(path, "login required");
            Redirect::to(&format!("/login?next={path}")).into_response()
        },
    }
}
