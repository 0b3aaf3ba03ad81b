// src/services/credential_service.rs
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Hashing failed: {0}")]
    Hashing(String),

    #[error("Stored credential hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// A one-way hash of a driver secret in PHC string form.
///
/// Only [`CredentialService::hash`] or the store can produce one, so writing a
/// record back never hashes the value a second time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Wraps a hash read back from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// Argon2 cost settings, in KiB / iterations / lanes.
#[derive(Debug, Clone, Copy)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Minimal cost, for tests only.
    pub fn fast() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }
}

pub struct CredentialService {
    argon2: Argon2<'static>,
}

impl CredentialService {
    pub fn new(config: HashingConfig) -> Result<Self, CredentialError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Salts and hashes `secret` on the blocking pool.
    pub async fn hash(&self, secret: &str) -> Result<CredentialHash, CredentialError> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| CredentialHash(hash.to_string()))
                .map_err(|e| CredentialError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// A mismatch is `Ok(false)`; anything else that goes wrong is an error.
    pub async fn verify(&self, secret: &str, hash: &CredentialHash) -> Result<bool, CredentialError> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();
        let stored = hash.0.clone();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored)
                .map_err(|e| CredentialError::MalformedHash(e.to_string()))?;
            match argon2.verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => {
                    tracing::error!("Credential verification failed: {}", e);
                    Err(CredentialError::Hashing(e.to_string()))
                }
            }
        })
        .await
        .map_err(|e| CredentialError::Task(e.to_string()))?
    }
}
