// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the portfolio server.

pub mod login;

pub use login::{require_login, CurrentUser};
