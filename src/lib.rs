//! LTI 1.3 Tool Library
//!
//! Runtime for the tool side of IMS LTI 1.3: OIDC third-party login,
//! launch verification, and the services a tool calls back on the platform.
//!
//! # Features
//!
//! - **Launch**: OIDC login redirect, state cookies, nonce replay checks,
//!   signature and claim validation into a typed [`message::LaunchMessage`]
//! - **Trust**: platform JWK set lookup by `kid`, tool-side RS256 signing
//! - **Services**: client-credentials access tokens, Assignment and Grade
//!   Services, Names and Role Provisioning Services with paging
//! - **Deep Linking**: signed content-item responses with an auto-posting form
//! - **Routing**: `:param` path patterns dispatched after launch
//!
//! # Usage
//!
//! ```no_run
//! use lti_tool::{Config, LtiTool};
//!
//! # fn main() -> lti_tool::Result<()> {
//! let config = Config::load(Some(std::path::Path::new("lti-tool.yaml")))?;
//! config.validate()?;
//! let tool = LtiTool::new(config)?;
//! # let _ = tool;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod deep_linking;
pub mod error;
pub mod launch;
pub mod message;
pub mod platform;
pub mod router;
pub mod server;
pub mod tool;
pub mod trust;

pub use config::Config;
pub use error::{Error, Result};
pub use tool::LtiTool;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
