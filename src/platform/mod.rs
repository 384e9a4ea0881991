//! Authenticated calls into platform services.
//!
//! Every call first exchanges a signed client-credentials assertion for a
//! bearer token at the platform's token endpoint, then performs a single
//! HTTP request with that token. Tokens are not reused between calls.

pub mod ags;
pub mod nrps;

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use reqwest::{
    Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

pub use ags::AgService;
pub use nrps::NrpService;

use crate::{Error, Result, trust::TrustProvider};

/// Lifetime of a client-credentials assertion
const ASSERTION_LIFETIME_SECS: i64 = 60;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const JSON: &str = "application/json";

/// Claims of the client-credentials assertion
#[derive(Debug, Serialize)]
struct ClientAssertion<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// One authenticated request to a platform service
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    scopes: Vec<String>,
    url: String,
    method: Method,
    body: Option<Vec<u8>>,
    content_type: String,
    accept: String,
}

impl ServiceRequest {
    /// GET `url` with `application/json` for both content type and accept
    pub fn new<S: AsRef<str>>(scopes: &[S], url: impl Into<String>) -> Self {
        Self {
            scopes: scopes.iter().map(|s| s.as_ref().to_string()).collect(),
            url: url.into(),
            method: Method::GET,
            body: None,
            content_type: JSON.to_string(),
            accept: JSON.to_string(),
        }
    }

    /// HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Raw body, attached for POST and PUT
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self> {
        Ok(self.body(serde_json::to_vec(value)?))
    }

    /// `Content-Type` of the body
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// `Accept` header
    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    fn sends_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }
}

/// Raw outcome of a service request; status is not interpreted
#[derive(Debug, Clone)]
pub struct ServiceResult {
    /// Response status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl ServiceResult {
    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as UTF-8 text, lossy
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Fail with a remote error unless the status is 2xx
    pub fn ensure_success(self, operation: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::remote(
                operation,
                format!("HTTP {} - {}", self.status, self.text()),
            ))
        }
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self, operation: &str) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::remote(operation, format!("invalid response body: {e}")))
    }
}

/// Service request client bound to one platform registration
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    trust: Arc<TrustProvider>,
    client_id: String,
    issuer: String,
    token_url: String,
}

impl PlatformClient {
    /// Create a client
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        trust: Arc<TrustProvider>,
        client_id: impl Into<String>,
        issuer: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            trust,
            client_id: client_id.into(),
            issuer: issuer.into(),
            token_url: token_url.into(),
        }
    }

    /// Exchange a signed assertion for a bearer token covering `scopes`
    pub async fn get_access_token<S: AsRef<str>>(&self, scopes: &[S]) -> Result<String> {
        const OP: &str = "GetAccessToken";

        let iat = Utc::now().timestamp();
        let claims = ClientAssertion {
            iss: &self.issuer,
            sub: &self.client_id,
            aud: &self.token_url,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
            jti: format!("lti-service-token-{}", uuid::Uuid::new_v4()),
        };
        let assertion = self.trust.sign_with_algorithm(&claims, Algorithm::RS256)?;

        let mut sorted: Vec<&str> = scopes.iter().map(|s| s.as_ref()).collect();
        sorted.sort_unstable();
        let scope = sorted.join(" ");

        debug!(url = %self.token_url, scope = %scope, "Requesting access token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::remote(OP, format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(OP, format!("HTTP {status} - {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::remote(OP, format!("failed to parse token response: {e}")))?;

        debug!(
            token_type = ?token.token_type,
            expires_in = ?token.expires_in,
            "Access token issued"
        );
        Ok(token.access_token)
    }

    /// Perform one authenticated request.
    ///
    /// The response status is returned as-is; callers decide what a non-2xx
    /// status means for them.
    pub async fn do_service_request(&self, request: ServiceRequest) -> Result<ServiceResult> {
        const OP: &str = "ServiceRequest";

        let token = self.get_access_token(request.scopes.as_slice()).await?;

        debug!(method = %request.method, url = %request.url, "Calling platform service");

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, &request.accept);

        if request.sends_body() {
            if let Some(body) = request.body {
                builder = builder.header(CONTENT_TYPE, &request.content_type).body(body);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::remote(OP, format!("{} {}: {e}", request.method, request.url)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::remote(OP, format!("failed to read response body: {e}")))?
            .to_vec();

        debug!(status = %status, bytes = body.len(), "Platform service responded");
        Ok(ServiceResult {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_json_get() {
        let request = ServiceRequest::new(&["scope-a"], "https://lms.example.edu/x");

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.content_type, JSON);
        assert_eq!(request.accept, JSON);
        assert!(request.body.is_none());
    }

    #[test]
    fn body_is_sent_only_for_post_and_put() {
        let get = ServiceRequest::new(&["s"], "u").body("x");
        let post = ServiceRequest::new(&["s"], "u").method(Method::POST);
        let put = ServiceRequest::new(&["s"], "u").method(Method::PUT);
        let delete = ServiceRequest::new(&["s"], "u").method(Method::DELETE);

        assert!(!get.sends_body());
        assert!(post.sends_body());
        assert!(put.sends_body());
        assert!(!delete.sends_body());
    }

    #[test]
    fn ensure_success_wraps_operation() {
        let result = ServiceResult {
            status: StatusCode::FORBIDDEN,
            headers: HeaderMap::new(),
            body: b"nope".to_vec(),
        };

        let err = result.ensure_success("PutGrade").unwrap_err();
        assert_eq!(err.to_string(), "PutGrade: HTTP 403 Forbidden - nope");
    }
}
