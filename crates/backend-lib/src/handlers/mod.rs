// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers. Pages are answered with small JSON view-models.
pub mod auth;
pub mod feedback;
pub mod pages;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::SESSION_COOKIE;

/// Session token carried by the request, if any
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

pub(crate) fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
