//! LTI 1.3 message model
//!
//! Wire-shaped records exchanged with the platform:
//!
//! - [`launch`]: the validated launch message and its claim sub-objects
//! - [`ags`]: line items, scores and results (Assignment and Grade Services)
//! - [`nrps`]: roster membership (Names and Role Provisioning Services)
//! - [`deep_linking`]: content items and the deep-linking response
//! - [`roles`]: role vocabulary URIs

pub mod ags;
pub mod deep_linking;
pub mod launch;
pub mod nrps;
pub mod roles;

pub use ags::{ActivityProgress, Grade, GradeResult, GradingProgress, LineItem};
pub use deep_linking::{ContentItem, DeepLinkingResponse};
pub use launch::{
    AgsEndpoint, Context, DeepLinkingSettings, LaunchKind, LaunchMessage, LaunchPresentation,
    Lis, MessageType, NrpsEndpoint, ResourceLink, ToolPlatform, UserIdentity,
};
pub use nrps::{Member, MemberResponse, MembershipContext};

/// LTI version this tool accepts and emits
pub const LTI_VERSION: &str = "1.3.0";

/// Claim names used outside of typed deserialization
pub mod claims {
    /// Message type claim
    pub const MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
    /// LTI version claim
    pub const VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
    /// Roles claim
    pub const ROLES: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
    /// Resource link claim
    pub const RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
    /// Deep-linking settings claim
    pub const DEEP_LINKING_SETTINGS: &str =
        "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings";
    /// Subject claim
    pub const SUBJECT: &str = "sub";
    /// Audience claim
    pub const AUDIENCE: &str = "aud";
    /// Nonce claim
    pub const NONCE: &str = "nonce";
}

/// OAuth2 scopes for platform services
pub mod scopes {
    /// Manage line items
    pub const LINE_ITEM: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem";
    /// Read line items
    pub const LINE_ITEM_READONLY: &str =
        "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem.readonly";
    /// Read results
    pub const RESULT_READONLY: &str =
        "https://purl.imsglobal.org/spec/lti-ags/scope/result.readonly";
    /// Publish scores
    pub const SCORE: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/score";
    /// Read the context roster
    pub const CONTEXT_MEMBERSHIP_READONLY: &str =
        "https://purl.imsglobal.org/spec/lti-nrps/scope/contextmembership.readonly";
}

/// Media types for platform service payloads
pub mod media_types {
    /// Line-item collection
    pub const LINE_ITEM_CONTAINER: &str = "application/vnd.ims.lis.v2.lineitemcontainer+json";
    /// Single line item
    pub const LINE_ITEM: &str = "application/vnd.ims.lis.v2.lineitem+json";
    /// Score submission
    pub const SCORE: &str = "application/vnd.ims.lis.v1.score+json";
    /// Result collection
    pub const RESULT_CONTAINER: &str = "application/vnd.ims.lis.v2.resultcontainer+json";
    /// Roster page
    pub const MEMBERSHIP_CONTAINER: &str =
        "application/vnd.ims.lti-nrps.v2.membershipcontainer+json";
}
