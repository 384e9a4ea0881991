//! Launch message model and required-claim validation.
//!
//! A verified launch token is first deserialized into [`LaunchClaims`], where
//! every claim is optional or defaulted, then promoted into a [`LaunchMessage`]
//! by an explicit validation pass:
//!
//! 1. Claims required on every launch (`iss`, `aud`, `iat`, `exp`, `nonce`, ...).
//! 2. Claims required by the declared message type, dispatched on
//!    [`MessageType`] (`resource_link.id` or `deep_linking_settings.*`).
//! 3. Required fields inside optional claim objects, checked only when the
//!    object is present.
//!
//! The first missing field aborts with [`Error::Validation`] naming its dotted
//! path, e.g. `Field resource_link.id was missing`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Launch message types this tool accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    /// Launch from a resource link
    #[serde(rename = "LtiResourceLinkRequest")]
    ResourceLinkRequest,
    /// Content selection launch
    #[serde(rename = "LtiDeepLinkingRequest")]
    DeepLinkingRequest,
}

impl MessageType {
    /// Claim value for this message type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResourceLinkRequest => "LtiResourceLinkRequest",
            Self::DeepLinkingRequest => "LtiDeepLinkingRequest",
        }
    }

    /// Parse a `message_type` claim value
    #[must_use]
    pub fn from_claim(value: &str) -> Option<Self> {
        match value {
            "LtiResourceLinkRequest" => Some(Self::ResourceLinkRequest),
            "LtiDeepLinkingRequest" => Some(Self::DeepLinkingRequest),
            _ => None,
        }
    }
}

/// Resource link from which the launch occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLink {
    /// Platform-unique id of the link (required)
    pub id: String,
    /// Link title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Course or other context the launch came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Context id (required)
    pub id: String,
    /// Context type URIs
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub context_type: Vec<String>,
    /// Short label, e.g. a course code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Full title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Platform instance that issued the launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPlatform {
    /// Stable platform instance id (required)
    pub guid: String,
    /// Administrative contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Home URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Product family, e.g. `canvas`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_family_code: Option<String>,
    /// Product version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// How the platform will display the tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchPresentation {
    /// `frame`, `iframe` or `window`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_target: Option<String>,
    /// Frame height; platforms send either a number or a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,
    /// Frame width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    /// Where to send the user when done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    /// Preferred locale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Learning Information Services identifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Lis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offering_sourcedid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_section_sourcedid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_sourcedid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_sourcedid: Option<String>,
}

/// Assignment and Grade Services endpoint claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgsEndpoint {
    /// Scopes granted to the tool (required)
    pub scope: Vec<String>,
    /// Line-item collection URL for the context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineitems: Option<String>,
    /// Line item bound to this resource link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineitem: Option<String>,
}

/// Names and Role Provisioning Services endpoint claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NrpsEndpoint {
    /// Roster URL (required)
    pub context_memberships_url: String,
    /// Supported service versions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_versions: Vec<String>,
}

/// Deep-linking settings carried by a content selection launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepLinkingSettings {
    /// Where the signed response must be posted (required)
    pub deep_link_return_url: String,
    /// Content item types the platform accepts (required)
    pub accept_types: Vec<String>,
    /// Presentation targets the platform supports
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accept_presentation_document_targets: Vec<String>,
    /// Accepted media types for `file` items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_media_types: Option<String>,
    /// Whether more than one item may be returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_multiple: Option<bool>,
    /// Whether line items may be declared on returned links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_lineitem: Option<bool>,
    /// Whether the platform creates items without further user action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_create: Option<bool>,
    /// Default title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Default text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque value that must be echoed in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Claims of a verified launch token before required-field validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LaunchClaims {
    iss: String,
    #[serde(deserialize_with = "first_audience")]
    aud: String,
    azp: Option<String>,
    iat: i64,
    exp: i64,
    nonce: String,

    sub: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    middle_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,

    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    message_type: String,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version")]
    version: String,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id")]
    deployment_id: String,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/target_link_uri")]
    target_link_uri: String,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/resource_link")]
    resource_link: Option<ResourceLink>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/roles")]
    roles: Vec<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/role_scope_mentor")]
    role_scope_mentor: Vec<String>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/context")]
    context: Option<Context>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/tool_platform")]
    tool_platform: Option<ToolPlatform>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/launch_presentation")]
    launch_presentation: Option<LaunchPresentation>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/lis")]
    lis: Option<Lis>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/custom")]
    custom: Map<String, Value>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint")]
    endpoint: Option<AgsEndpoint>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice")]
    names_role_service: Option<NrpsEndpoint>,
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings")]
    deep_linking_settings: Option<DeepLinkingSettings>,
}

/// `aud` may be a single string or a list; the first entry is the client id
fn first_audience<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Audience::deserialize(deserializer)? {
        Audience::One(aud) => aud,
        Audience::Many(list) => list.into_iter().next().unwrap_or_default(),
    })
}

/// Identity of the launching user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    /// Platform user id (`sub`)
    pub subject: String,
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Middle name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Full display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Message-type specific payload of a launch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchKind {
    /// `LtiResourceLinkRequest`
    ResourceLink(ResourceLink),
    /// `LtiDeepLinkingRequest`
    DeepLinking(DeepLinkingSettings),
}

/// A validated launch. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchMessage {
    /// Platform issuer
    pub issuer: String,
    /// Client id the token was issued to
    pub audience: String,
    /// Authorized party
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_party: Option<String>,
    /// Issued-at (Unix seconds)
    pub issued_at: i64,
    /// Expiry (Unix seconds)
    pub expires_at: i64,
    /// Nonce echoed from the login request
    pub nonce: String,
    /// LTI version
    pub version: String,
    /// Deployment id
    pub deployment_id: String,
    /// Where the platform intended the launch to land
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link_uri: Option<String>,
    /// Resource-link or deep-linking payload
    pub kind: LaunchKind,
    /// Launching user, `None` for anonymous launches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<UserIdentity>,
    /// Role URIs
    pub roles: Vec<String>,
    /// Users the launching mentor may access
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub role_scope_mentor: Vec<String>,
    /// Course context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Issuing platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_platform: Option<ToolPlatform>,
    /// Display hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_presentation: Option<LaunchPresentation>,
    /// LIS identifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lis: Option<Lis>,
    /// Custom parameters
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
    /// AGS endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ags_endpoint: Option<AgsEndpoint>,
    /// NRPS endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrps_endpoint: Option<NrpsEndpoint>,
}

fn missing(path: &str) -> Error {
    Error::Validation(format!("Field {path} was missing"))
}

fn require(value: &str, path: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(missing(path))
    } else {
        Ok(())
    }
}

/// Required fields of a claim object
trait RequiredFields {
    fn check_required(&self, path: &str) -> Result<()>;
}

impl RequiredFields for ResourceLink {
    fn check_required(&self, path: &str) -> Result<()> {
        require(&self.id, &format!("{path}.id"))
    }
}

impl RequiredFields for Context {
    fn check_required(&self, path: &str) -> Result<()> {
        require(&self.id, &format!("{path}.id"))
    }
}

impl RequiredFields for ToolPlatform {
    fn check_required(&self, path: &str) -> Result<()> {
        require(&self.guid, &format!("{path}.guid"))
    }
}

impl RequiredFields for AgsEndpoint {
    fn check_required(&self, path: &str) -> Result<()> {
        if self.scope.is_empty() {
            return Err(missing(&format!("{path}.scope")));
        }
        Ok(())
    }
}

impl RequiredFields for NrpsEndpoint {
    fn check_required(&self, path: &str) -> Result<()> {
        require(
            &self.context_memberships_url,
            &format!("{path}.context_memberships_url"),
        )
    }
}

impl RequiredFields for DeepLinkingSettings {
    fn check_required(&self, path: &str) -> Result<()> {
        require(
            &self.deep_link_return_url,
            &format!("{path}.deep_link_return_url"),
        )?;
        if self.accept_types.is_empty() {
            return Err(missing(&format!("{path}.accept_types")));
        }
        Ok(())
    }
}

/// Check a claim object only when it is present
fn check_present<T: RequiredFields>(value: Option<&T>, path: &str) -> Result<()> {
    value.map_or(Ok(()), |v| v.check_required(path))
}

impl LaunchClaims {
    fn check_common(&self) -> Result<()> {
        require(&self.iss, "iss")?;
        require(&self.aud, "aud")?;
        if self.iat == 0 {
            return Err(missing("iat"));
        }
        if self.exp == 0 {
            return Err(missing("exp"));
        }
        require(&self.nonce, "nonce")?;
        require(&self.message_type, "message_type")?;
        require(&self.version, "version")?;
        require(&self.deployment_id, "deployment_id")
    }

    fn check_optional_objects(&self) -> Result<()> {
        check_present(self.context.as_ref(), "context")?;
        check_present(self.tool_platform.as_ref(), "tool_platform")?;
        check_present(self.endpoint.as_ref(), "endpoint")?;
        check_present(self.names_role_service.as_ref(), "names_role_service")
    }

    /// `LtiResourceLinkRequest`: target link and resource link are required
    fn take_resource_link(&mut self) -> Result<LaunchKind> {
        require(&self.target_link_uri, "target_link_uri")?;
        let link = self
            .resource_link
            .take()
            .ok_or_else(|| missing("resource_link"))?;
        link.check_required("resource_link")?;
        Ok(LaunchKind::ResourceLink(link))
    }

    /// `LtiDeepLinkingRequest`: deep-linking settings are required
    fn take_deep_linking(&mut self) -> Result<LaunchKind> {
        let settings = self
            .deep_linking_settings
            .take()
            .ok_or_else(|| missing("deep_linking_settings"))?;
        settings.check_required("deep_linking_settings")?;
        Ok(LaunchKind::DeepLinking(settings))
    }

    fn into_message(mut self) -> Result<LaunchMessage> {
        self.check_common()?;

        let kind = match MessageType::from_claim(&self.message_type) {
            Some(MessageType::ResourceLinkRequest) => self.take_resource_link()?,
            Some(MessageType::DeepLinkingRequest) => self.take_deep_linking()?,
            None => {
                return Err(Error::Validation(format!(
                    "unknown message type ({:?})",
                    self.message_type
                )));
            }
        };

        self.check_optional_objects()?;

        let identity = self
            .sub
            .filter(|sub| !sub.is_empty())
            .map(|subject| UserIdentity {
                subject,
                given_name: self.given_name,
                family_name: self.family_name,
                middle_name: self.middle_name,
                name: self.name,
                email: self.email,
                picture: self.picture,
            });

        Ok(LaunchMessage {
            issuer: self.iss,
            audience: self.aud,
            authorized_party: self.azp,
            issued_at: self.iat,
            expires_at: self.exp,
            nonce: self.nonce,
            version: self.version,
            deployment_id: self.deployment_id,
            target_link_uri: Some(self.target_link_uri).filter(|uri| !uri.is_empty()),
            kind,
            identity,
            roles: self.roles,
            role_scope_mentor: self.role_scope_mentor,
            context: self.context,
            tool_platform: self.tool_platform,
            launch_presentation: self.launch_presentation,
            lis: self.lis,
            custom: self.custom,
            ags_endpoint: self.endpoint,
            nrps_endpoint: self.names_role_service,
        })
    }
}

impl LaunchMessage {
    /// Build a launch message from verified token claims.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when claims are malformed or a required field is
    /// missing; the message names the field's dotted path.
    pub fn from_claims(claims: Map<String, Value>) -> Result<Self> {
        let raw: LaunchClaims = serde_json::from_value(Value::Object(claims))
            .map_err(|e| Error::Validation(format!("malformed launch claims: {e}")))?;
        raw.into_message()
    }

    /// Declared message type
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self.kind {
            LaunchKind::ResourceLink(_) => MessageType::ResourceLinkRequest,
            LaunchKind::DeepLinking(_) => MessageType::DeepLinkingRequest,
        }
    }

    /// Resource link, for resource-link launches
    #[must_use]
    pub fn resource_link(&self) -> Option<&ResourceLink> {
        match &self.kind {
            LaunchKind::ResourceLink(link) => Some(link),
            LaunchKind::DeepLinking(_) => None,
        }
    }

    /// Deep-linking settings, for deep-linking launches
    #[must_use]
    pub fn deep_linking_settings(&self) -> Option<&DeepLinkingSettings> {
        match &self.kind {
            LaunchKind::DeepLinking(settings) => Some(settings),
            LaunchKind::ResourceLink(_) => None,
        }
    }

    /// `true` when the launch carries no `sub` claim
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }

    /// Platform user id
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.subject.as_str())
    }

    /// Given name
    #[must_use]
    pub fn given_name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|id| id.given_name.as_deref())
    }

    /// Family name
    #[must_use]
    pub fn family_name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|id| id.family_name.as_deref())
    }

    /// Full display name
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|id| id.name.as_deref())
    }

    /// Email address
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|id| id.email.as_deref())
    }

    /// Whether the launch includes `role`
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the launch includes any of `roles`
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.as_str()))
    }

    /// Custom parameter as a string
    #[must_use]
    pub fn custom_param(&self, key: &str) -> Option<&str> {
        self.custom.get(key).and_then(Value::as_str)
    }
}
