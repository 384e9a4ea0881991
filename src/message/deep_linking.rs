//! Deep-linking content items and response claims

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{LTI_VERSION, LaunchMessage, LineItem};
use crate::{Error, Result};

/// Lifetime of a signed deep-linking response
pub const RESPONSE_LIFETIME_SECS: i64 = 3600;

/// Message type of the response
pub const RESPONSE_MESSAGE_TYPE: &str = "LtiDeepLinkingResponse";

/// Icon or thumbnail reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image URL
    pub url: String,
    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Open in a new window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Window name to target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    /// Width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `window.open` feature string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_features: Option<String>,
}

/// Embed in an iframe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Iframe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Embed as an HTML snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    /// HTML to embed
    pub html: String,
}

/// A plain hyperlink
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkItem {
    /// Target URL
    pub url: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageRef>,
    /// Thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    /// Window presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
    /// Iframe presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iframe: Option<Iframe>,
    /// Embed presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
}

/// A launchable LTI resource link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceLinkItem {
    /// Launch URL; the tool's default launch URL when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageRef>,
    /// Thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    /// Line item the platform should create for this link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_item: Option<LineItem>,
    /// Custom parameters sent back on launch
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
    /// Window presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
    /// Iframe presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iframe: Option<Iframe>,
}

/// A downloadable file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileItem {
    /// Download URL
    pub url: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageRef>,
    /// Thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    /// When the URL stops working (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// An HTML fragment placed inline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlFragmentItem {
    /// Markup
    pub html: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageItem {
    /// Image URL
    pub url: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Alt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ImageRef>,
    /// Thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageRef>,
    /// Width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Content item returned to the platform, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentItem {
    /// `link`
    #[serde(rename = "link")]
    Link(LinkItem),
    /// `ltiResourceLink`
    #[serde(rename = "ltiResourceLink")]
    ResourceLink(ResourceLinkItem),
    /// `file`
    #[serde(rename = "file")]
    File(FileItem),
    /// `html`
    #[serde(rename = "html")]
    HtmlFragment(HtmlFragmentItem),
    /// `image`
    #[serde(rename = "image")]
    Image(ImageItem),
}

impl ContentItem {
    /// Wire value of the `type` field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Link(_) => "link",
            Self::ResourceLink(_) => "ltiResourceLink",
            Self::File(_) => "file",
            Self::HtmlFragment(_) => "html",
            Self::Image(_) => "image",
        }
    }

    /// Value that identifies the item within its kind
    #[must_use]
    pub fn unique_content(&self) -> &str {
        match self {
            Self::Link(item) => &item.url,
            Self::ResourceLink(item) => item
                .url
                .as_deref()
                .or(item.title.as_deref())
                .unwrap_or_default(),
            Self::File(item) => &item.url,
            Self::HtmlFragment(item) => &item.html,
            Self::Image(item) => &item.url,
        }
    }

    /// Drop items whose `(kind, unique content)` was already seen, keeping order.
    ///
    /// A resource link without a URL launches the default URL, so it is only
    /// a duplicate when every field matches.
    #[must_use]
    pub fn dedupe(items: Vec<Self>) -> Vec<Self> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| seen.insert((item.kind(), item.dedupe_key())))
            .collect()
    }

    fn dedupe_key(&self) -> String {
        match self {
            Self::ResourceLink(item) if item.url.is_none() => {
                serde_json::to_string(item).unwrap_or_else(|_| self.unique_content().to_owned())
            }
            _ => self.unique_content().to_owned(),
        }
    }
}

/// Claims of a signed deep-linking response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepLinkingResponse {
    /// Tool client id (the launch's audience)
    pub iss: String,
    /// Platform issuer (the launch's issuer)
    pub aud: String,
    /// Issued at
    pub iat: i64,
    /// Expiry
    pub exp: i64,
    /// Nonce echoed from the launch
    pub nonce: String,
    /// Always `LtiDeepLinkingResponse`
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    pub message_type: String,
    /// LTI version
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version")]
    pub version: String,
    /// Deployment id echoed from the launch
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id")]
    pub deployment_id: String,
    /// Opaque `data` echoed from the deep-linking settings
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-dl/claim/data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<String>,
    /// Selected items
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-dl/claim/content_items")]
    pub content_items: Vec<ContentItem>,
    /// Message shown to the user by the platform
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-dl/claim/msg",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub msg: Option<String>,
    /// Message logged by the platform
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-dl/claim/log",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub log: Option<String>,
}

impl DeepLinkingResponse {
    /// Build the response to a deep-linking launch.
    ///
    /// Issuer and audience are swapped relative to the launch, nonce and
    /// deployment id are echoed, and the items are deduplicated.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when `msg` is not a deep-linking launch, or when
    /// the platform does not accept multiple items and more than one remains.
    pub fn for_launch(msg: &LaunchMessage, items: Vec<ContentItem>, now: i64) -> Result<Self> {
        let settings = msg.deep_linking_settings().ok_or_else(|| {
            Error::Validation("launch is not a deep-linking request".to_string())
        })?;

        let content_items = ContentItem::dedupe(items);
        if settings.accept_multiple == Some(false) && content_items.len() > 1 {
            return Err(Error::Validation(format!(
                "platform accepts a single content item, got {}",
                content_items.len()
            )));
        }

        Ok(Self {
            iss: msg.audience.clone(),
            aud: msg.issuer.clone(),
            iat: now,
            exp: now + RESPONSE_LIFETIME_SECS,
            nonce: msg.nonce.clone(),
            message_type: RESPONSE_MESSAGE_TYPE.to_string(),
            version: LTI_VERSION.to_string(),
            deployment_id: msg.deployment_id.clone(),
            data: settings.data.clone(),
            content_items,
            msg: None,
            log: None,
        })
    }

    /// Attach a user-facing message
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Attach a log entry for the platform
    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}
