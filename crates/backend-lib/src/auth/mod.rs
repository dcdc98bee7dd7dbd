// ============================
// portfolio-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cipher;
pub mod encryptor;
pub mod password;
pub mod session;
mod service;
mod service_impl;

pub use cipher::ReversibleCipher;
pub use encryptor::{CryptoError, Encryptor};
pub use password::PasswordHasher;
pub use service::{AuthError, AuthService, AuthenticatedUser};
pub use service_impl::{seed_accounts, DefaultAuth};
pub use session::{Session, SessionManager, SESSION_COOKIE};
