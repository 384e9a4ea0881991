use std::future::Future;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{InboundRequest, state};
use crate::{
    Error, LtiTool, Result,
    config::NoncePolicy,
    message::{LTI_VERSION, LaunchMessage, MessageType, claims as claim},
};

impl LtiTool {
    /// Verify and validate a launch, producing the typed message.
    ///
    /// Steps run in order and stop at the first failure:
    /// signature, state, nonce (when enforced), audience, message shape,
    /// typed parse.
    ///
    /// # Errors
    ///
    /// [`Error::Trust`] for a missing or unverifiable token, otherwise
    /// [`Error::Validation`] naming the failed check.
    pub async fn accept_launch(&self, request: &InboundRequest) -> Result<LaunchMessage> {
        let token = request
            .param("id_token")
            .ok_or_else(|| Error::Trust("id_token is missing".to_string()))?;

        let claims = self.trust().verify(token).await?;

        state::validate_state(request.param("state"), request.cookies())?;
        self.check_nonce(&claims)?;
        validate_audience(&claims, &self.config().client_id)?;
        check_message_shape(&claims, self.config().allow_anonymous)?;

        let msg = LaunchMessage::from_claims(claims)?;
        info!(
            issuer = %msg.issuer,
            deployment = %msg.deployment_id,
            message_type = msg.message_type().as_str(),
            "Launch accepted"
        );
        Ok(msg)
    }

    /// Accept a launch and pass the message to `handler`
    pub async fn handle_launch<F, Fut, T>(&self, request: &InboundRequest, handler: F) -> Result<T>
    where
        F: FnOnce(LaunchMessage) -> Fut,
        Fut: Future<Output = T>,
    {
        let msg = self.accept_launch(request).await?;
        Ok(handler(msg).await)
    }

    fn check_nonce(&self, claims: &Map<String, Value>) -> Result<()> {
        match self.config().nonce_policy {
            NoncePolicy::Disabled => {
                debug!("Nonce replay check disabled");
                Ok(())
            }
            NoncePolicy::Enforce => {
                let nonce = claims
                    .get(claim::NONCE)
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if self.nonce_store().consume(nonce) {
                    Ok(())
                } else {
                    warn!("Launch nonce unknown or already used");
                    Err(Error::Validation(
                        "nonce was not issued by this tool or was already used".to_string(),
                    ))
                }
            }
        }
    }
}

/// `aud` (a string, or the first entry of a list) must equal the client id
pub(crate) fn validate_audience(claims: &Map<String, Value>, client_id: &str) -> Result<()> {
    let aud = match claims.get(claim::AUDIENCE) {
        Some(Value::String(aud)) => aud.as_str(),
        Some(Value::Array(list)) => list.first().and_then(Value::as_str).unwrap_or_default(),
        other => {
            return Err(Error::Validation(format!(
                "aud claim is unexpected type: {other:?}"
            )));
        }
    };

    if aud == client_id {
        Ok(())
    } else {
        Err(Error::Validation(
            "client id does not match issuer registration".to_string(),
        ))
    }
}

fn non_empty_str<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Claim checks that precede the typed parse
pub(crate) fn check_message_shape(
    claims: &Map<String, Value>,
    allow_anonymous: bool,
) -> Result<()> {
    let message_type = claims
        .get(claim::MESSAGE_TYPE)
        .and_then(Value::as_str)
        .unwrap_or_default();

    let kind = match message_type {
        "" => {
            return Err(Error::Validation(
                "Empty message type not allowed".to_string(),
            ));
        }
        other => MessageType::from_claim(other).ok_or_else(|| {
            Error::Validation(format!("unknown message type ({other:?})"))
        })?,
    };

    check_common_shape(claims, allow_anonymous)?;

    match kind {
        MessageType::ResourceLinkRequest => {
            let link = claims
                .get(claim::RESOURCE_LINK)
                .and_then(Value::as_object)
                .ok_or_else(|| Error::Validation("resource link claim is missing".to_string()))?;
            non_empty_str(link.get("id"))
                .ok_or_else(|| Error::Validation("resource link id is missing".to_string()))?;
        }
        MessageType::DeepLinkingRequest => {
            let settings = claims
                .get(claim::DEEP_LINKING_SETTINGS)
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    Error::Validation("deep link settings claim is missing".to_string())
                })?;
            non_empty_str(settings.get("deep_link_return_url")).ok_or_else(|| {
                Error::Validation("deep link return url is missing".to_string())
            })?;
        }
    }

    Ok(())
}

fn check_common_shape(claims: &Map<String, Value>, allow_anonymous: bool) -> Result<()> {
    if !allow_anonymous && non_empty_str(claims.get(claim::SUBJECT)).is_none() {
        return Err(Error::Validation(
            "token is missing user (sub) claim".to_string(),
        ));
    }

    if claims.get(claim::VERSION).and_then(Value::as_str) != Some(LTI_VERSION) {
        return Err(Error::Validation(
            "token has incompatible lti version".to_string(),
        ));
    }

    if claims.get(claim::ROLES).is_none_or(Value::is_null) {
        return Err(Error::Validation("token is missing roles claim".to_string()));
    }

    Ok(())
}
