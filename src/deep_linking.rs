//! Signed deep-linking responses.
//!
//! The response must reach the platform from the user's browser, so the
//! signed token is delivered inside an HTML page whose form posts itself to
//! the deep-link return URL.

use chrono::Utc;
use tracing::debug;

use crate::{
    Error, LtiTool, Result,
    message::{ContentItem, DeepLinkingResponse, LaunchMessage},
};

/// Form field carrying the signed response
pub const RESPONSE_FIELD: &str = "JWT";

impl LtiTool {
    /// Build and sign the response to a deep-linking launch
    pub fn deep_linking_response_jwt(
        &self,
        msg: &LaunchMessage,
        items: Vec<ContentItem>,
    ) -> Result<String> {
        let response = DeepLinkingResponse::for_launch(msg, items, Utc::now().timestamp())?;
        let token = self.trust().sign(&response)?;
        debug!(
            items = response.content_items.len(),
            aud = %response.aud,
            "Deep linking response signed"
        );
        Ok(token)
    }

    /// Auto-submitting HTML page that posts the signed response to the platform
    pub fn deep_linking_response_html(
        &self,
        msg: &LaunchMessage,
        items: Vec<ContentItem>,
    ) -> Result<String> {
        let return_url = msg
            .deep_linking_settings()
            .map(|settings| settings.deep_link_return_url.clone())
            .ok_or_else(|| Error::Validation("launch is not a deep-linking request".to_string()))?;
        let token = self.deep_linking_response_jwt(msg, items)?;
        Ok(auto_submit_form(&return_url, &token))
    }
}

fn auto_submit_form(action: &str, token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Returning to platform</title></head>
<body onload="document.forms[0].submit()">
<form method="post" action="{action}">
<input type="hidden" name="{RESPONSE_FIELD}" value="{token}">
<noscript><button type="submit">Continue</button></noscript>
</form>
</body>
</html>
"#,
        action = escape_html(action),
        token = escape_html(token),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
