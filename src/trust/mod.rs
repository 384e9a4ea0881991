//! Token trust: verifying platform tokens and signing the tool's own.
//!
//! Incoming launch tokens are verified against the platform's published key
//! set, looked up by the token's `kid`. Outgoing tokens (client-credentials
//! assertions, deep-linking responses) are signed with a key obtained from a
//! registered [`SigningKeySupplier`].

mod keyset;
mod signing;

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

pub use signing::{SigningKey, SigningKeySupplier, StaticSigningKey};

use crate::{Error, Result};

/// Clock skew tolerated on `exp`/`iat`
const LEEWAY_SECS: u64 = 60;

/// Algorithms accepted on incoming tokens
const ACCEPTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Resolves verification keys and signs outgoing tokens
pub struct TrustProvider {
    http: reqwest::Client,
    key_set_url: String,
    outgoing_kid: String,
    signing_key: RwLock<Option<Arc<dyn SigningKeySupplier>>>,
}

impl std::fmt::Debug for TrustProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustProvider")
            .field("key_set_url", &self.key_set_url)
            .field("outgoing_kid", &self.outgoing_kid)
            .field("has_signing_key", &self.signing_key.read().is_some())
            .finish_non_exhaustive()
    }
}

impl TrustProvider {
    /// Create a provider with no signing key registered
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        key_set_url: impl Into<String>,
        outgoing_kid: impl Into<String>,
    ) -> Self {
        Self {
            http,
            key_set_url: key_set_url.into(),
            outgoing_kid: outgoing_kid.into(),
            signing_key: RwLock::new(None),
        }
    }

    /// Register (or replace) the signing key supplier
    pub fn set_signing_key(&self, supplier: Arc<dyn SigningKeySupplier>) {
        *self.signing_key.write() = Some(supplier);
    }

    /// Whether a signing key supplier is registered
    pub fn has_signing_key(&self) -> bool {
        self.signing_key.read().is_some()
    }

    /// Resolve the verification key for a token header.
    ///
    /// Fetches the key set on every call.
    pub async fn resolve_verification_key(&self, header: &Header) -> Result<DecodingKey> {
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| Error::Trust("token header has no kid".to_string()))?;

        let jwks = keyset::fetch(&self.http, &self.key_set_url).await?;
        let jwk = keyset::select(&jwks, kid)?;
        keyset::decoding_key(jwk)
    }

    /// Verify a platform token and return its claims.
    ///
    /// Checks signature, `exp` and `nbf`. Audience is left to the caller.
    pub async fn verify(&self, token: &str) -> Result<Map<String, Value>> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| Error::Trust(format!("malformed token: {e}")))?;

        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(Error::Trust(format!(
                "unsupported signing algorithm {:?}",
                header.alg
            )));
        }

        let key = self.resolve_verification_key(&header).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)
            .map_err(|e| Error::Trust(format!("token verification failed: {e}")))?;

        debug!(kid = ?header.kid, "Token signature verified");
        Ok(data.claims)
    }

    fn current_key(&self) -> Result<SigningKey> {
        let supplier = self
            .signing_key
            .read()
            .clone()
            .ok_or_else(|| Error::Config("no signing key registered".to_string()))?;
        supplier.signing_key()
    }

    fn encode<T: Serialize>(&self, key: &SigningKey, claims: &T) -> Result<String> {
        let mut header = Header::new(key.algorithm);
        header.typ = Some("JWT".to_string());
        if !self.outgoing_kid.is_empty() {
            header.kid = Some(self.outgoing_kid.clone());
        }
        Ok(jsonwebtoken::encode(&header, claims, &key.key)?)
    }

    /// Sign `claims` with the registered key
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        let key = self.current_key()?;
        self.encode(&key, claims)
    }

    /// Sign `claims`, requiring the registered key to use `algorithm`
    pub fn sign_with_algorithm<T: Serialize>(
        &self,
        claims: &T,
        algorithm: Algorithm,
    ) -> Result<String> {
        let key = self.current_key()?;
        if key.algorithm != algorithm {
            return Err(Error::Config(format!(
                "signing key uses {:?}, {algorithm:?} required",
                key.algorithm
            )));
        }
        self.encode(&key, claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::EncodingKey;
    use serde_json::json;

    use super::*;

    const PEM: &[u8] = include_bytes!("../../tests/fixtures/signing_key.pem");

    fn provider() -> TrustProvider {
        TrustProvider::new(reqwest::Client::new(), "http://127.0.0.1:9/jwks", "tool-kid")
    }

    #[test]
    fn sign_without_key_is_config_error() {
        let err = provider().sign(&json!({"a": 1})).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn signed_header_carries_kid_and_type() {
        // GIVEN: a provider with an RSA key registered
        let trust = provider();
        trust.set_signing_key(Arc::new(StaticSigningKey::from_rsa_pem(PEM).unwrap()));

        // WHEN: signing claims
        let token = trust.sign(&json!({"sub": "x"})).unwrap();

        // THEN: the header declares algorithm, type, and configured kid
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.kid.as_deref(), Some("tool-kid"));
    }

    #[test]
    fn algorithm_mismatch_is_config_error() {
        let trust = provider();
        trust.set_signing_key(Arc::new(|| -> Result<SigningKey> {
            Ok(SigningKey {
                algorithm: Algorithm::HS256,
                key: EncodingKey::from_secret(b"secret"),
            })
        }));

        let err = trust
            .sign_with_algorithm(&json!({}), Algorithm::RS256)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn token_without_kid_is_trust_error() {
        let trust = provider();
        let header = Header::new(Algorithm::RS256);
        let err = trust.resolve_verification_key(&header).await.unwrap_err();
        assert!(matches!(err, Error::Trust(_)));
    }

    #[tokio::test]
    async fn symmetric_token_is_refused_before_fetch() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({"exp": 4_000_000_000_u64}),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = provider().verify(&token).await.unwrap_err();
        assert!(err.to_string().contains("unsupported signing algorithm"));
    }
}
