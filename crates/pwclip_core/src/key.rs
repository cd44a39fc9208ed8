use std::fmt;

use argon2::Argon2;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::KeyError;

/// Size in bytes of every derived key
pub const KEY_SIZE: usize = 64;

// Fixed salts: derivation has to be reproducible from the secret alone.
const PASSPHRASE_SALT: &[u8] = b"PWCLIP_PASSPHRASE_KEY_CONTEXT_v1";
const KEYFILE_SALT: &[u8] = b"PWCLIP_KEYFILE_KEY_CONTEXT_v1";
const KEYFILE_INFO: &[u8] = b"pwclip key file";

/// Fixed-length key material, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    /// Wrap already derived bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        DerivedKey(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Prevent accidentally printing key material
impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey(length={})", self.0.len())
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SENSITIVE DATA REDACTED]")
    }
}

/// Turns a passphrase or key file into a [`DerivedKey`]
pub trait KeyProvider {
    /// Derive the key for `secret`; the same input always yields the same key
    fn derive_key(&self, secret: &[u8]) -> Result<DerivedKey, KeyError>;
}

/// Argon2id cost settings for passphrase stretching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB
    pub memory_cost_kib: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_cost_kib: 64 * 1024,
            time_cost: 3,
            parallelism: 1,
        }
    }
}

/// Stretches a typed passphrase with Argon2id
#[derive(Debug, Clone, Default)]
pub struct PassphraseKeyProvider {
    params: Argon2Params,
}

impl PassphraseKeyProvider {
    /// Provider with explicit cost settings
    pub fn with_params(params: Argon2Params) -> Self {
        Self { params }
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn derive_key(&self, secret: &[u8]) -> Result<DerivedKey, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::EmptySecret);
        }

        let params = argon2::Params::new(
            self.params.memory_cost_kib,
            self.params.time_cost,
            self.params.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let mut key = vec![0u8; KEY_SIZE];
        if let Err(e) = argon2.hash_password_into(secret, PASSPHRASE_SALT, &mut key) {
            key.zeroize();
            return Err(KeyError::DerivationFailed(e.to_string()));
        }

        Ok(DerivedKey(key))
    }
}

/// Expands the contents of a key file with HKDF-SHA512
///
/// Key files are expected to hold high-entropy bytes already, so no
/// stretching is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFileProvider;

impl KeyProvider for KeyFileProvider {
    fn derive_key(&self, secret: &[u8]) -> Result<DerivedKey, KeyError> {
        if secret.is_empty() {
            return Err(KeyError::EmptySecret);
        }

        let hk = hkdf::Hkdf::<Sha512>::new(Some(KEYFILE_SALT), secret);
        let mut key = vec![0u8; KEY_SIZE];
        hk.expand(KEYFILE_INFO, &mut key)
            .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

        Ok(DerivedKey(key))
    }
}
