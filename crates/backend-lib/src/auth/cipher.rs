// ============================
// portfolio-backend-lib/src/auth/cipher.rs
// ============================
//! Reversible encryption for values that sit in the session.
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use super::CryptoError;

/// Key used when the configuration does not provide one (base64url, 32 bytes)
pub const DEFAULT_KEY: &str = "7pK_fnSKIjZKuv_Gwc--sZEMKn2zc8VvD6zS96XcNHE=";

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// AES-256-GCM cipher keyed by a static secret
///
/// Tokens are `base64url(nonce || ciphertext)`; a fresh nonce is drawn for
/// every call so the same plaintext never yields the same token twice.
#[derive(Clone)]
pub struct ReversibleCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for ReversibleCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReversibleCipher(..)")
    }
}

impl Default for ReversibleCipher {
    fn default() -> Self {
        Self::new(DEFAULT_KEY).expect("built-in key is 32 bytes of base64url")
    }
}

impl ReversibleCipher {
    /// Build a cipher from a base64url encoded 32-byte key
    pub fn new(key_b64: &str) -> Result<Self, CryptoError> {
        let key = URL_SAFE
            .decode(key_b64.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Encrypt a UTF-8 string into an opaque token
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Seal)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(URL_SAFE.encode(combined))
    }

    /// Recover the plaintext of a token produced by [`encrypt`](Self::encrypt)
    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let combined = URL_SAFE
            .decode(token.trim())
            .map_err(|_| CryptoError::MalformedToken)?;
        if combined.len() < NONCE_LEN {
            return Err(CryptoError::MalformedToken);
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CryptoError::Open)?;
        String::from_utf8(opened).map_err(|_| CryptoError::MalformedToken)
    }
}
