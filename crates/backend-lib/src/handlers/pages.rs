// ============================
// crates/backend-lib/src/handlers/pages.rs
// ============================
//! Read-only pages.
use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use rand::seq::IndexedRandom;
use serde_json::{json, Value};

use crate::middleware::CurrentUser;
use crate::resume::{load_resume, Resume};
use crate::AppState;

pub const FUN_FACTS: [&str; 3] = [
    "I started university when I was a wee lad of 15 years.",
    "I have a pet sparrow.",
    "I write poetry.",
];

fn page(name: &str) -> Json<Value> {
    Json(json!({ "page": name }))
}

pub async fn home() -> Json<Value> {
    let fun_fact = FUN_FACTS.choose(&mut rand::rng()).copied().unwrap_or_default();
    Json(json!({ "page": "home", "fun_fact": fun_fact }))
}

pub async fn login() -> Json<Value> {
    page("login")
}

pub async fn register() -> Json<Value> {
    page("register")
}

pub async fn projects() -> Json<Value> {
    page("projects")
}

pub async fn piano() -> Json<Value> {
    page("piano")
}

/// Login-gated; `user` is the display name the room will show
pub async fn chat(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "page": "chat", "user": user.session.display_name() }))
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Json<Resume> {
    Json(load_resume(state.gateway.as_ref()).await)
}
