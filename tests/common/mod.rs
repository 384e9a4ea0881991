//! Shared fixtures: a mock platform and signed launch tokens

#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use lti_tool::{
    Config, LtiTool, config::NoncePolicy, launch::InboundRequest, trust::StaticSigningKey,
};

pub const CLIENT_ID: &str = "client-1";
pub const KID: &str = "test-key-1";
pub const DEPLOYMENT_ID: &str = "deployment-1";
pub const STATE: &str = "state-fixed";
pub const PEM: &[u8] = include_bytes!("../fixtures/signing_key.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");

/// Mock platform serving its key set and token endpoint
pub async fn platform() -> MockServer {
    let server = MockServer::start().await;

    let jwks: Value = serde_json::from_str(JWKS).unwrap();
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "platform-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    server
}

pub fn config(server: &MockServer, nonce_policy: NoncePolicy) -> Config {
    Config {
        auth_login_url: format!("{}/auth", server.uri()),
        launch_url: "https://tool.example.com/launch".into(),
        client_id: CLIENT_ID.into(),
        key_set_url: format!("{}/jwks", server.uri()),
        auth_token_url: format!("{}/token", server.uri()),
        issuer: "https://tool.example.com".into(),
        outgoing_kid: "tool-key-1".into(),
        nonce_policy,
        ..Config::default()
    }
}

/// Tool registered with `server`, holding the fixture signing key
pub fn tool(server: &MockServer, nonce_policy: NoncePolicy) -> LtiTool {
    let tool = LtiTool::new(config(server, nonce_policy)).unwrap();
    tool.set_signing_key(Arc::new(StaticSigningKey::from_rsa_pem(PEM).unwrap()));
    tool
}

/// Sign `claims` the way the platform would
pub fn sign_launch(claims: &Value) -> String {
    sign_launch_with_kid(claims, KID)
}

pub fn sign_launch_with_kid(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_pem(PEM).unwrap()).unwrap()
}

/// Claims of a complete resource-link launch from `server`
pub fn resource_link_claims(server: &MockServer) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": server.uri(),
        "aud": CLIENT_ID,
        "sub": "user-42",
        "iat": now,
        "exp": now + 300,
        "nonce": "nonce-from-platform",
        "name": "Ada Lovelace",
        "given_name": "Ada",
        "email": "ada@example.edu",
        "https://purl.imsglobal.org/spec/lti/claim/message_type": "LtiResourceLinkRequest",
        "https://purl.imsglobal.org/spec/lti/claim/version": "1.3.0",
        "https://purl.imsglobal.org/spec/lti/claim/deployment_id": DEPLOYMENT_ID,
        "https://purl.imsglobal.org/spec/lti/claim/target_link_uri":
            "https://tool.example.com/assignments/42",
        "https://purl.imsglobal.org/spec/lti/claim/resource_link": {
            "id": "link-1",
            "title": "Week 1 quiz"
        },
        "https://purl.imsglobal.org/spec/lti/claim/roles": [
            "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner"
        ],
        "https://purl.imsglobal.org/spec/lti/claim/context": {
            "id": "course-1",
            "label": "CS101",
            "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseOffering"]
        },
        "https://purl.imsglobal.org/spec/lti/claim/custom": { "difficulty": "hard" },
        "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint": {
            "scope": [
                "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem",
                "https://purl.imsglobal.org/spec/lti-ags/scope/score",
                "https://purl.imsglobal.org/spec/lti-ags/scope/result.readonly"
            ],
            "lineitems": format!("{}/lineitems", server.uri())
        },
        "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice": {
            "context_memberships_url": format!("{}/members", server.uri()),
            "service_versions": ["2.0"]
        }
    })
}

/// Claims of a deep-linking launch from `server`
pub fn deep_linking_claims(server: &MockServer) -> Value {
    let mut claims = resource_link_claims(server);
    let map = claims.as_object_mut().unwrap();
    map.remove("https://purl.imsglobal.org/spec/lti/claim/resource_link");
    map.insert(
        "https://purl.imsglobal.org/spec/lti/claim/message_type".into(),
        json!("LtiDeepLinkingRequest"),
    );
    map.insert(
        "https://purl.imsglobal.org/spec/lti/claim/target_link_uri".into(),
        json!("https://tool.example.com/deep-link"),
    );
    map.insert(
        "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings".into(),
        json!({
            "deep_link_return_url": format!("{}/deep-link-return", server.uri()),
            "accept_types": ["link", "ltiResourceLink"],
            "accept_multiple": false,
            "data": "opaque-platform-data"
        }),
    );
    claims
}

pub fn state_jar(state: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(format!("lti_tool_{state}"), state.to_string()))
}

/// Launch form post carrying `token` and the fixed state with its cookie
pub fn launch_request(token: &str) -> InboundRequest {
    let params = HashMap::from([
        ("id_token".to_string(), token.to_string()),
        ("state".to_string(), STATE.to_string()),
    ]);
    InboundRequest::new(params, state_jar(STATE))
}
