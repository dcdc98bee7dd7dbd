// ============================
// portfolio-backend-lib/src/auth/password.rs
// ============================
//! One-way password hashing.
use scrypt::{scrypt, Params};
use std::fmt::Write as _;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

/// Salt used when the configuration does not provide one
pub const DEFAULT_SALT: &str = "averysaltysailortookalongwalkoffashortbridge";
/// scrypt CPU/memory cost, as a power of two (N = 32)
pub const LOG_N: u8 = 5;
/// scrypt block size
pub const BLOCK_SIZE: u32 = 9;
/// scrypt parallelism
pub const PARALLELISM: u32 = 1;
/// Digest length in bytes (rendered as twice as many hex chars)
pub const DIGEST_LEN: usize = 64;

/// Deterministic salted scrypt hasher
///
/// Cost parameters are fixed at construction. Equal inputs always produce
/// equal digests, so stored hashes can be matched with a plain equality lookup.
#[derive(Clone)]
pub struct PasswordHasher {
    salt: Vec<u8>,
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("log_n", &self.params.log_n())
            .field("r", &self.params.r())
            .field("p", &self.params.p())
            .finish_non_exhaustive()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_SALT.as_bytes()).expect("built-in scrypt parameters are valid")
    }
}

impl PasswordHasher {
    /// Create a hasher with the built-in cost parameters and the given salt
    pub fn new(salt: &[u8]) -> Result<Self, CryptoError> {
        let params = Params::new(LOG_N, BLOCK_SIZE, PARALLELISM, DIGEST_LEN)
            .map_err(|e| CryptoError::Params(e.to_string()))?;
        Ok(Self {
            salt: salt.to_vec(),
            params,
        })
    }

    /// Hash a password into a lowercase hex digest
    pub fn hash(&self, plain: &str) -> Result<String, CryptoError> {
        let mut digest = [0u8; DIGEST_LEN];
        scrypt(plain.as_bytes(), &self.salt, &self.params, &mut digest)
            .map_err(|e| CryptoError::Params(e.to_string()))?;

        let mut hex = String::with_capacity(DIGEST_LEN * 2);
        for byte in &digest {
            let _ = write!(hex, "{byte:02x}");
        }
        digest.zeroize();
        Ok(hex)
    }

    /// Recompute the digest of `plain` and compare it with `digest`
    pub fn verify(&self, digest: &str, plain: &str) -> bool {
        match self.hash(plain) {
            Ok(candidate) => candidate.as_bytes().ct_eq(digest.as_bytes()).into(),
            Err(_) => false,
        }
    }
}
