//! The tool runtime: one platform registration and everything bound to it

use std::sync::Arc;

use tracing::warn;

use crate::{
    Config, Result,
    config::NoncePolicy,
    launch::{InMemoryNonceStore, NonceStore},
    message::LaunchMessage,
    platform::{AgService, NrpService, PlatformClient},
    trust::{SigningKeySupplier, TrustProvider},
};

/// LTI 1.3 tool bound to a single platform registration.
///
/// Shareable across request handlers behind an `Arc`; all state is
/// read-only after construction except the signing key slot.
pub struct LtiTool {
    config: Config,
    trust: Arc<TrustProvider>,
    platform: PlatformClient,
    nonces: Arc<dyn NonceStore>,
}

impl std::fmt::Debug for LtiTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LtiTool")
            .field("client_id", &self.config.client_id)
            .field("trust", &self.trust)
            .finish_non_exhaustive()
    }
}

impl LtiTool {
    /// Build the tool and its HTTP client
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        let trust = Arc::new(TrustProvider::new(
            http.clone(),
            config.key_set_url.clone(),
            config.outgoing_kid.clone(),
        ));
        let platform = PlatformClient::new(
            http,
            Arc::clone(&trust),
            config.client_id.clone(),
            config.issuer.clone(),
            config.auth_token_url.clone(),
        );

        if config.nonce_policy == NoncePolicy::Disabled {
            warn!("Nonce replay checking is disabled");
        }

        Ok(Self {
            config,
            trust,
            platform,
            nonces: Arc::new(InMemoryNonceStore::new()),
        })
    }

    /// Replace the in-memory nonce store
    #[must_use]
    pub fn with_nonce_store(mut self, store: Arc<dyn NonceStore>) -> Self {
        self.nonces = store;
        self
    }

    /// Registration and server settings
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Verification and signing
    #[must_use]
    pub fn trust(&self) -> &TrustProvider {
        &self.trust
    }

    /// Service request client
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.platform
    }

    pub(crate) fn nonce_store(&self) -> &dyn NonceStore {
        self.nonces.as_ref()
    }

    /// Register the key used for every token the tool signs
    pub fn set_signing_key(&self, supplier: Arc<dyn SigningKeySupplier>) {
        self.trust.set_signing_key(supplier);
    }

    /// Grade services for `msg`
    pub fn ags(&self, msg: &LaunchMessage) -> Result<AgService<'_>> {
        AgService::new(&self.platform, msg)
    }

    /// Roster service for `msg`
    pub fn nrps(&self, msg: &LaunchMessage) -> Result<NrpService<'_>> {
        NrpService::new(&self.platform, msg)
    }
}
