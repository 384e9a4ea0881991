//! Launch acceptance against a mock platform key set

mod common;

use std::collections::HashMap;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::*;
use lti_tool::{
    Error,
    config::NoncePolicy,
    launch::InboundRequest,
    message::{MessageType, roles},
};

#[tokio::test]
async fn signed_resource_link_launch_is_accepted() {
    // GIVEN: a complete launch signed with the platform's published key
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&resource_link_claims(&server));

    // WHEN: the launch is posted with a matching state cookie
    let msg = tool.accept_launch(&launch_request(&token)).await.unwrap();

    // THEN: the typed message carries the claims
    assert_eq!(msg.message_type(), MessageType::ResourceLinkRequest);
    assert_eq!(msg.issuer, server.uri());
    assert_eq!(msg.audience, CLIENT_ID);
    assert_eq!(msg.deployment_id, DEPLOYMENT_ID);
    assert_eq!(msg.subject(), Some("user-42"));
    assert_eq!(msg.given_name(), Some("Ada"));
    assert_eq!(msg.resource_link().unwrap().id, "link-1");
    assert!(msg.has_role(roles::CONTEXT_LEARNER));
    assert!(!msg.has_any_role(roles::TEACHING));
    assert_eq!(msg.custom_param("difficulty"), Some("hard"));
    assert_eq!(msg.context.as_ref().unwrap().label.as_deref(), Some("CS101"));
    assert!(msg.ags_endpoint.is_some());
    assert!(msg.nrps_endpoint.is_some());
}

#[tokio::test]
async fn handle_launch_passes_message_to_handler() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&resource_link_claims(&server));

    let subject = tool
        .handle_launch(&launch_request(&token), |msg| async move {
            msg.subject().map(str::to_string)
        })
        .await
        .unwrap();

    assert_eq!(subject.as_deref(), Some("user-42"));
}

#[tokio::test]
async fn missing_id_token_is_trust_error() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let request = InboundRequest::new(
        HashMap::from([("state".to_string(), STATE.to_string())]),
        state_jar(STATE),
    );

    let err = tool.accept_launch(&request).await.unwrap_err();
    assert!(matches!(err, Error::Trust(_)), "got {err}");
}

#[tokio::test]
async fn unknown_kid_is_trust_error() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch_with_kid(&resource_link_claims(&server), "rotated-away");

    let err = tool.accept_launch(&launch_request(&token)).await.unwrap_err();
    assert!(matches!(err, Error::Trust(_)), "got {err}");
}

#[tokio::test]
async fn expired_token_is_trust_error() {
    // GIVEN: a token that expired well beyond the clock-skew leeway
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = resource_link_claims(&server);
    let past = Utc::now().timestamp() - 600;
    claims["iat"] = json!(past - 300);
    claims["exp"] = json!(past);

    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Trust(_)), "got {err}");
}

#[tokio::test]
async fn token_not_yet_valid_is_trust_error() {
    // GIVEN: a token whose nbf lies beyond the clock-skew leeway
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = resource_link_claims(&server);
    claims["nbf"] = json!(Utc::now().timestamp() + 600);

    // WHEN: the launch is posted
    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    // THEN: it is refused before any claim is read
    assert!(matches!(err, Error::Trust(_)), "got {err}");
}

#[tokio::test]
async fn state_without_cookie_is_rejected() {
    // GIVEN: a valid token but no cookie for the submitted state
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&resource_link_claims(&server));
    let request = InboundRequest::new(
        HashMap::from([
            ("id_token".to_string(), token),
            ("state".to_string(), STATE.to_string()),
        ]),
        CookieJar::new(),
    );

    // WHEN/THEN: the launch is rejected as a validation failure
    let err = tool.accept_launch(&request).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err}");
    assert!(err.is_rejection());
}

#[tokio::test]
async fn state_cookie_with_other_value_is_rejected() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&resource_link_claims(&server));
    let jar = CookieJar::new().add(Cookie::new(format!("lti_tool_{STATE}"), "state-other"));
    let request = InboundRequest::new(
        HashMap::from([
            ("id_token".to_string(), token),
            ("state".to_string(), STATE.to_string()),
        ]),
        jar,
    );

    let err = tool.accept_launch(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: state not found");
}

#[tokio::test]
async fn compat_state_cookie_is_accepted() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&resource_link_claims(&server));
    let jar = CookieJar::new().add(Cookie::new(format!("lti_tool2_{STATE}"), STATE));
    let request = InboundRequest::new(
        HashMap::from([
            ("id_token".to_string(), token),
            ("state".to_string(), STATE.to_string()),
        ]),
        jar,
    );

    assert!(tool.accept_launch(&request).await.is_ok());
}

#[tokio::test]
async fn audience_for_other_client_is_rejected() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = resource_link_claims(&server);
    claims["aud"] = json!(["other-client", CLIENT_ID]);

    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation error: client id does not match issuer registration"
    );
}

#[tokio::test]
async fn resource_link_without_id_is_rejected() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = resource_link_claims(&server);
    claims["https://purl.imsglobal.org/spec/lti/claim/resource_link"] = json!({"title": "x"});

    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Validation error: resource link id is missing");
}

#[tokio::test]
async fn missing_deployment_id_names_the_field() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = resource_link_claims(&server);
    claims
        .as_object_mut()
        .unwrap()
        .remove("https://purl.imsglobal.org/spec/lti/claim/deployment_id");

    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("deployment_id"), "got {err}");
}

#[tokio::test]
async fn deep_linking_launch_exposes_settings() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let token = sign_launch(&deep_linking_claims(&server));

    let msg = tool.accept_launch(&launch_request(&token)).await.unwrap();

    assert_eq!(msg.message_type(), MessageType::DeepLinkingRequest);
    let settings = msg.deep_linking_settings().unwrap();
    assert_eq!(
        settings.deep_link_return_url,
        format!("{}/deep-link-return", server.uri())
    );
    assert_eq!(settings.accept_multiple, Some(false));
    assert!(msg.resource_link().is_none());
}

#[tokio::test]
async fn deep_linking_launch_without_return_url_is_rejected() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Disabled);
    let mut claims = deep_linking_claims(&server);
    claims["https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings"] =
        json!({"accept_types": ["link"]});

    let err = tool
        .accept_launch(&launch_request(&sign_launch(&claims)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Validation error: deep link return url is missing");
}

#[tokio::test]
async fn enforced_nonce_is_single_use() {
    // GIVEN: a tool that enforces nonces and a login it initiated
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Enforce);
    let login = InboundRequest::new(
        HashMap::from([
            ("iss".to_string(), server.uri()),
            ("login_hint".to_string(), "user-42".to_string()),
        ]),
        CookieJar::new(),
    );
    let redirect = tool.initiate_login(&login).unwrap();

    // AND: the platform echoes the issued nonce in its launch
    let mut claims = resource_link_claims(&server);
    claims["nonce"] = json!(redirect.nonce);
    let token = sign_launch(&claims);
    let request = InboundRequest::new(
        HashMap::from([
            ("id_token".to_string(), token),
            ("state".to_string(), redirect.state.clone()),
        ]),
        redirect.apply_cookies(CookieJar::new()),
    );

    // WHEN: the same launch is posted twice
    let first = tool.accept_launch(&request).await;
    let replay = tool.accept_launch(&request).await;

    // THEN: only the first is accepted
    assert!(first.is_ok(), "first launch: {:?}", first.err());
    assert!(matches!(replay, Err(Error::Validation(_))));
}

#[tokio::test]
async fn enforced_nonce_rejects_unissued_value() {
    let server = platform().await;
    let tool = tool(&server, NoncePolicy::Enforce);
    let token = sign_launch(&resource_link_claims(&server));

    let err = tool.accept_launch(&launch_request(&token)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err}");
}

/// Store that redeems every nonce and records what it saw
#[derive(Default)]
struct RecordingStore {
    consumed: parking_lot::Mutex<Vec<String>>,
}

impl lti_tool::launch::NonceStore for RecordingStore {
    fn issue(&self, _nonce: &str) {}

    fn consume(&self, nonce: &str) -> bool {
        self.consumed.lock().push(nonce.to_string());
        true
    }
}

#[tokio::test]
async fn custom_nonce_store_decides_replay() {
    // GIVEN: an enforcing tool backed by a shared store
    let server = platform().await;
    let store = std::sync::Arc::new(RecordingStore::default());
    let tool = tool(&server, NoncePolicy::Enforce).with_nonce_store(store.clone());
    let token = sign_launch(&resource_link_claims(&server));

    // WHEN: a launch arrives with a nonce issued elsewhere
    let result = tool.accept_launch(&launch_request(&token)).await;

    // THEN: the store was consulted and its answer honored
    assert!(result.is_ok(), "got {:?}", result.err());
    assert_eq!(*store.consumed.lock(), vec!["nonce-from-platform".to_string()]);
}
