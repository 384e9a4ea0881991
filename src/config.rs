//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tool configuration: the platform registration plus local server settings.
///
/// Set once at construction and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform OIDC authorization endpoint the login step redirects to
    pub auth_login_url: String,
    /// Tool URL that receives the launch (`redirect_uri`)
    pub launch_url: String,
    /// Client id the platform issued to this tool
    pub client_id: String,
    /// Platform JWK set URL used to verify launch tokens
    pub key_set_url: String,
    /// Platform OAuth2 token endpoint (client-credentials grant)
    pub auth_token_url: String,
    /// Issuer the tool puts in its outgoing assertions
    pub issuer: String,
    /// `kid` header placed on tokens the tool signs
    pub outgoing_kid: String,
    /// PEM file holding the tool's RSA private key
    pub signing_key_path: Option<String>,
    /// Timeout applied to every outbound platform call
    pub http_timeout_secs: u64,
    /// Accept launches without a `sub` claim
    pub allow_anonymous: bool,
    /// Nonce replay checking
    pub nonce_policy: NoncePolicy,
    /// Local HTTP server
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_login_url: String::new(),
            launch_url: String::new(),
            client_id: String::new(),
            key_set_url: String::new(),
            auth_token_url: String::new(),
            issuer: String::new(),
            outgoing_kid: String::new(),
            signing_key_path: None,
            http_timeout_secs: 30,
            allow_anonymous: false,
            nonce_policy: NoncePolicy::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Whether the launch `nonce` claim is checked against nonces issued at login
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// Never checked; platforms do not echo the nonce reliably
    #[default]
    Disabled,
    /// Every launch must carry a nonce issued by this process, used once
    Enforce,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8345,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Environment variables use the `LTI_TOOL_` prefix, with `__` separating
    /// nested keys (`LTI_TOOL_SERVER__PORT=9000`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("LTI_TOOL_").split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Check that the platform registration is complete
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("auth_login_url", &self.auth_login_url),
            ("launch_url", &self.launch_url),
            ("client_id", &self.client_id),
            ("key_set_url", &self.key_set_url),
            ("auth_token_url", &self.auth_token_url),
            ("issuer", &self.issuer),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }

    /// Outbound call timeout
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
