use tracing::{debug, info};
use url::Url;

use super::{InboundRequest, LoginRedirect, state};
use crate::{Error, LtiTool, Result, config::NoncePolicy};

impl LtiTool {
    /// Answer a platform's OIDC login request with a redirect to its
    /// authorization endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the launch URL or login URL is not configured
    /// - [`Error::Validation`] when `iss` or `login_hint` is missing
    pub fn initiate_login(&self, request: &InboundRequest) -> Result<LoginRedirect> {
        let config = self.config();
        if config.launch_url.is_empty() {
            return Err(Error::Config("launch url is not configured".to_string()));
        }

        let issuer = request
            .param("iss")
            .ok_or_else(|| Error::Validation("issuer not found".to_string()))?;
        let login_hint = request
            .param("login_hint")
            .ok_or_else(|| Error::Validation("login hint not found".to_string()))?;

        let state = state::generate_token("state");
        let nonce = state::generate_token("nonce");

        match config.nonce_policy {
            NoncePolicy::Enforce => self.nonce_store().issue(&nonce),
            NoncePolicy::Disabled => {}
        }

        let mut location = Url::parse(&config.auth_login_url)
            .map_err(|e| Error::Config(format!("invalid auth login url: {e}")))?;
        {
            let mut query = location.query_pairs_mut();
            query
                .append_pair("scope", "openid")
                .append_pair("response_type", "id_token")
                .append_pair("response_mode", "form_post")
                .append_pair("prompt", "none")
                .append_pair("client_id", &config.client_id)
                .append_pair("redirect_uri", &config.launch_url)
                .append_pair("state", &state)
                .append_pair("nonce", &nonce)
                .append_pair("login_hint", login_hint);
            if let Some(hint) = request.param("lti_message_hint") {
                query.append_pair("lti_message_hint", hint);
            }
        }

        info!(issuer = %issuer, "OIDC login initiated");
        debug!(location = %location, "OIDC login redirect");

        Ok(LoginRedirect {
            cookies: state::state_cookies(&state),
            location,
            state,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum_extra::extract::cookie::CookieJar;

    use super::*;
    use crate::Config;

    fn tool(launch_url: &str) -> LtiTool {
        LtiTool::new(Config {
            auth_login_url: "https://lms.example.edu/auth?realm=1".into(),
            launch_url: launch_url.into(),
            client_id: "client-1".into(),
            ..Config::default()
        })
        .unwrap()
    }

    fn request(pairs: &[(&str, &str)]) -> InboundRequest {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        InboundRequest::new(params, CookieJar::new())
    }

    #[test]
    fn redirect_carries_oidc_parameters() {
        // GIVEN: a login request with a message hint
        let tool = tool("https://tool.example.com/launch");
        let req = request(&[
            ("iss", "https://lms.example.edu"),
            ("login_hint", "user-42"),
            ("lti_message_hint", "hint-7"),
        ]);

        // WHEN: initiating login
        let redirect = tool.initiate_login(&req).unwrap();

        // THEN: the query carries every OIDC parameter
        let query: HashMap<String, String> =
            redirect.location.query_pairs().into_owned().collect();
        assert_eq!(query["realm"], "1");
        assert_eq!(query["scope"], "openid");
        assert_eq!(query["response_type"], "id_token");
        assert_eq!(query["response_mode"], "form_post");
        assert_eq!(query["prompt"], "none");
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["redirect_uri"], "https://tool.example.com/launch");
        assert_eq!(query["login_hint"], "user-42");
        assert_eq!(query["lti_message_hint"], "hint-7");
        assert_eq!(query["state"], redirect.state);
        assert_eq!(query["nonce"], redirect.nonce);
        assert!(redirect.state.starts_with("state-"));
        assert!(redirect.nonce.starts_with("nonce-"));

        let [primary, compat] = &redirect.cookies;
        assert_eq!(primary.name(), format!("lti_tool_{}", redirect.state));
        assert_eq!(compat.name(), format!("lti_tool2_{}", redirect.state));
    }

    #[test]
    fn message_hint_is_optional() {
        let tool = tool("https://tool.example.com/launch");
        let req = request(&[("iss", "https://lms.example.edu"), ("login_hint", "u")]);

        let redirect = tool.initiate_login(&req).unwrap();
        assert!(
            !redirect
                .location
                .query_pairs()
                .any(|(k, _)| k == "lti_message_hint")
        );
    }

    #[test]
    fn missing_issuer_or_hint_is_rejected() {
        let tool = tool("https://tool.example.com/launch");

        let err = tool.initiate_login(&request(&[("login_hint", "u")])).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: issuer not found");

        let err = tool
            .initiate_login(&request(&[("iss", "https://lms.example.edu")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: login hint not found");
    }

    #[test]
    fn unconfigured_launch_url_is_config_error() {
        let tool = tool("");
        let req = request(&[("iss", "https://lms.example.edu"), ("login_hint", "u")]);

        assert!(matches!(tool.initiate_login(&req), Err(Error::Config(_))));
    }
}
