//! OIDC login initiation and launch acceptance.
//!
//! # Flow
//!
//! 1. The platform calls the login endpoint with `iss` and `login_hint`.
//!    [`LtiTool::initiate_login`](crate::LtiTool::initiate_login) answers with a
//!    [`LoginRedirect`] to the platform's authorization endpoint, carrying a
//!    fresh `state` (also stored in cookies) and `nonce`.
//! 2. The platform posts `id_token` and `state` to the launch endpoint.
//!    [`LtiTool::accept_launch`](crate::LtiTool::accept_launch) verifies the
//!    token, checks state, nonce, audience and message shape, then parses the
//!    claims into a [`LaunchMessage`](crate::message::LaunchMessage).

mod login;
pub mod nonce;
pub mod state;
mod validate;

use std::collections::HashMap;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use url::Url;

pub use nonce::{InMemoryNonceStore, NonceStore};

/// Form or query parameters of a login/launch request, plus its cookies
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    params: HashMap<String, String>,
    cookies: CookieJar,
}

impl InboundRequest {
    /// Wrap already-decoded parameters and cookies
    #[must_use]
    pub fn new(params: HashMap<String, String>, cookies: CookieJar) -> Self {
        Self { params, cookies }
    }

    /// Non-empty parameter value
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Request cookies
    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

/// Redirect answering a login request
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// Platform authorization URL with the OIDC query parameters
    pub location: Url,
    /// Anti-CSRF state sent to the platform
    pub state: String,
    /// Nonce sent to the platform
    pub nonce: String,
    /// Cookies that must be set on the response
    pub cookies: [Cookie<'static>; 2],
}

impl LoginRedirect {
    /// Add the state cookies to `jar`
    #[must_use]
    pub fn apply_cookies(&self, jar: CookieJar) -> CookieJar {
        self.cookies
            .iter()
            .cloned()
            .fold(jar, |jar, cookie| jar.add(cookie))
    }
}
