// ============================
// portfolio-backend-lib/src/auth/encryptor.rs
// ============================
//! One-way and reversible encryption bundled behind one handle.
use thiserror::Error;

use super::{PasswordHasher, ReversibleCipher};
use crate::config::CryptoSettings;

/// Errors raised by the encryption helpers
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid scrypt parameters: {0}")]
    Params(String),

    #[error("encryption key must be 32 bytes of base64url")]
    InvalidKey,

    #[error("failed to encrypt value")]
    Seal,

    #[error("failed to decrypt value")]
    Open,

    #[error("malformed encrypted token")]
    MalformedToken,
}

/// Encryption helper shared by the auth service and the session handlers
#[derive(Clone, Debug, Default)]
pub struct Encryptor {
    hasher: PasswordHasher,
    cipher: ReversibleCipher,
}

impl Encryptor {
    pub fn new(hasher: PasswordHasher, cipher: ReversibleCipher) -> Self {
        Self { hasher, cipher }
    }

    /// Build from configuration, falling back to the built-in salt and key
    pub fn from_settings(settings: &CryptoSettings) -> Result<Self, CryptoError> {
        let hasher = match &settings.salt {
            Some(salt) => PasswordHasher::new(salt.as_bytes())?,
            None => PasswordHasher::default(),
        };
        let cipher = match &settings.key {
            Some(key) => ReversibleCipher::new(key)?,
            None => ReversibleCipher::default(),
        };
        Ok(Self::new(hasher, cipher))
    }

    /// Hash a password for storage or comparison
    pub fn oneway(&self, plain: &str) -> Result<String, CryptoError> {
        self.hasher.hash(plain)
    }

    /// Constant-time check of `plain` against a stored digest
    pub fn verify(&self, digest: &str, plain: &str) -> bool {
        self.hasher.verify(digest, plain)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.cipher.encrypt(plaintext)
    }

    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        self.cipher.decrypt(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_override_defaults() {
        let default = Encryptor::default();
        let custom = Encryptor::from_settings(&CryptoSettings {
            salt: Some("pepper".into()),
            key: None,
        })
        .unwrap();
        assert_ne!(default.oneway("pw").unwrap(), custom.oneway("pw").unwrap());

        let token = custom.encrypt("a@b.c").unwrap();
        assert_eq!(default.decrypt(&token).unwrap(), "a@b.c");
    }

    #[test]
    fn verify_uses_the_configured_salt() {
        let default = Encryptor::default();
        let custom = Encryptor::from_settings(&CryptoSettings {
            salt: Some("pepper".into()),
            key: None,
        })
        .unwrap();
        let digest = custom.oneway("pw").unwrap();
        assert!(custom.verify(&digest, "pw"));
        assert!(!default.verify(&digest, "pw"));
    }

    #[test]
    fn bad_key_in_settings_fails() {
        let err = Encryptor::from_settings(&CryptoSettings {
            salt: None,
            key: Some("short".into()),
        })
        .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey));
    }
}
