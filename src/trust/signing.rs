//! Signing keys for tokens the tool issues

use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey};

use crate::{Error, Result};

/// Private key plus the algorithm it signs with
#[derive(Clone)]
pub struct SigningKey {
    /// JWS algorithm
    pub algorithm: Algorithm,
    /// Private key material
    pub key: EncodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Supplies the key used for outgoing tokens.
///
/// Called once per signed token, so implementations may rotate keys between
/// calls. Any `Fn() -> Result<SigningKey>` closure is a supplier.
pub trait SigningKeySupplier: Send + Sync {
    /// Current signing key
    fn signing_key(&self) -> Result<SigningKey>;
}

impl<F> SigningKeySupplier for F
where
    F: Fn() -> Result<SigningKey> + Send + Sync,
{
    fn signing_key(&self) -> Result<SigningKey> {
        self()
    }
}

/// A fixed RSA key loaded once
#[derive(Debug, Clone)]
pub struct StaticSigningKey {
    key: SigningKey,
}

impl StaticSigningKey {
    /// RS256 key from a PEM-encoded RSA private key
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| Error::Config(format!("invalid RSA signing key: {e}")))?;
        Ok(Self {
            key: SigningKey {
                algorithm: Algorithm::RS256,
                key,
            },
        })
    }

    /// RS256 key read from a PEM file
    pub fn from_rsa_pem_file(path: &Path) -> Result<Self> {
        let pem = std::fs::read(path).map_err(|e| {
            Error::Config(format!("cannot read signing key {}: {e}", path.display()))
        })?;
        Self::from_rsa_pem(&pem)
    }
}

impl SigningKeySupplier for StaticSigningKey {
    fn signing_key(&self) -> Result<SigningKey> {
        Ok(self.key.clone())
    }
}
