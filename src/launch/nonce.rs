//! Nonce replay store used when the nonce policy is `enforce`

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// How long an issued nonce stays redeemable
pub const NONCE_LIFETIME: Duration = Duration::from_secs(3600);

/// Records nonces issued at login and redeems each at most once
pub trait NonceStore: Send + Sync {
    /// Remember a freshly issued nonce
    fn issue(&self, nonce: &str);

    /// Redeem `nonce`; `false` when unknown, expired or already used
    fn consume(&self, nonce: &str) -> bool;
}

/// Process-local nonce store. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryNonceStore {
    issued: DashMap<String, Instant>,
    lifetime: Duration,
}

impl InMemoryNonceStore {
    /// Store with the default one-hour lifetime
    #[must_use]
    pub fn new() -> Self {
        Self::with_lifetime(NONCE_LIFETIME)
    }

    /// Store with a custom lifetime
    #[must_use]
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            issued: DashMap::new(),
            lifetime,
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn reap_expired(&self) -> usize {
        let before = self.issued.len();
        self.issued.retain(|_, issued_at| issued_at.elapsed() < self.lifetime);
        let removed = before.saturating_sub(self.issued.len());
        if removed > 0 {
            debug!(removed, "Reaped expired nonces");
        }
        removed
    }

    /// Number of outstanding nonces
    #[must_use]
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// `true` when no nonce is outstanding
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceStore for InMemoryNonceStore {
    fn issue(&self, nonce: &str) {
        self.reap_expired();
        self.issued.insert(nonce.to_string(), Instant::now());
    }

    fn consume(&self, nonce: &str) -> bool {
        self.issued
            .remove(nonce)
            .is_some_and(|(_, issued_at)| issued_at.elapsed() < self.lifetime)
    }
}
