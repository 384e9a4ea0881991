//! Platform key-set lookup.
//!
//! Every lookup refetches the key set; there is no cache.

use jsonwebtoken::{
    DecodingKey,
    jwk::{AlgorithmParameters, Jwk, JwkSet},
};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Fetch the platform's published key set
pub(crate) async fn fetch(http: &reqwest::Client, url: &str) -> Result<JwkSet> {
    debug!(url = %url, "Fetching platform key set");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Trust(format!("key set fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Trust(format!("key set fetch failed: HTTP {status}")));
    }

    response
        .json::<JwkSet>()
        .await
        .map_err(|e| Error::Trust(format!("key set is not a valid JWK set: {e}")))
}

/// Select the key for `kid`; the first one wins when several match
pub(crate) fn select<'a>(jwks: &'a JwkSet, kid: &str) -> Result<&'a Jwk> {
    let mut matches = jwks
        .keys
        .iter()
        .filter(|jwk| jwk.common.key_id.as_deref() == Some(kid));

    let first = matches
        .next()
        .ok_or_else(|| Error::Trust(format!("no key found for kid {kid:?}")))?;

    let extra = matches.count();
    if extra > 0 {
        warn!(kid = %kid, count = extra + 1, "Multiple keys share one kid, using the first");
    }

    Ok(first)
}

/// Convert a JWK to a verification key
pub(crate) fn decoding_key(jwk: &Jwk) -> Result<DecodingKey> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| Error::Trust(format!("unusable RSA key: {e}"))),
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| Error::Trust(format!("unusable EC key: {e}"))),
        AlgorithmParameters::OctetKey(_) | AlgorithmParameters::OctetKeyPair(_) => Err(
            Error::Trust("symmetric and OKP keys are not accepted".to_string()),
        ),
    }
}
