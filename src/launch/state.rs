//! Anti-replay `state` and `nonce` tokens and the state cookies.
//!
//! The login step stores `state` in two cookies named after the value
//! itself. The primary cookie is `SameSite=None; Secure` for browsers that
//! require it on cross-site POSTs; the compat cookie omits `SameSite` for
//! browsers that reject `SameSite=None`. The launch step accepts either.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Name prefix of the primary state cookie
pub const STATE_COOKIE_PREFIX: &str = "lti_tool_";

/// Name prefix of the compatibility state cookie
pub const COMPAT_COOKIE_PREFIX: &str = "lti_tool2_";

/// Lifetime of the state cookies
pub const STATE_LIFETIME_SECS: i64 = 3600;

/// 256-bit random token, base64url encoded, e.g. `state-<43 chars>`
#[must_use]
pub fn generate_token(prefix: &str) -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("{prefix}-{}", URL_SAFE_NO_PAD.encode(random_bytes))
}

/// The two cookies carrying `state`
#[must_use]
pub fn state_cookies(state: &str) -> [Cookie<'static>; 2] {
    let max_age = time::Duration::seconds(STATE_LIFETIME_SECS);

    let primary = Cookie::build((format!("{STATE_COOKIE_PREFIX}{state}"), state.to_string()))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::None)
        .secure(true)
        .http_only(true)
        .build();

    let compat = Cookie::build((format!("{COMPAT_COOKIE_PREFIX}{state}"), state.to_string()))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .build();

    [primary, compat]
}

/// Check the submitted `state` against its cookie
pub fn validate_state(state: Option<&str>, cookies: &CookieJar) -> Result<()> {
    let state = state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("state parameter is missing".to_string()))?;

    let cookie = cookies
        .get(&format!("{STATE_COOKIE_PREFIX}{state}"))
        .or_else(|| cookies.get(&format!("{COMPAT_COOKIE_PREFIX}{state}")))
        .ok_or_else(|| {
            Error::Validation(
                "missing state cookie; ensure the browser is not blocking cookies".to_string(),
            )
        })?;

    let stored = cookie.value();
    if stored.is_empty() {
        return Err(Error::Validation("empty state cookie in request".to_string()));
    }

    if bool::from(stored.as_bytes().ct_eq(state.as_bytes())) {
        Ok(())
    } else {
        Err(Error::Validation("state not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_prefixed_and_unique() {
        let a = generate_token("state");
        let b = generate_token("state");

        assert!(a.starts_with("state-"));
        assert_eq!(a.len(), "state-".len() + 43);
        assert_ne!(a, b);
    }

    #[test]
    fn primary_cookie_is_cross_site_and_compat_has_no_same_site() {
        let [primary, compat] = state_cookies("state-abc");

        assert_eq!(primary.name(), "lti_tool_state-abc");
        assert_eq!(primary.value(), "state-abc");
        assert_eq!(primary.same_site(), Some(SameSite::None));
        assert_eq!(primary.secure(), Some(true));
        assert_eq!(primary.max_age(), Some(time::Duration::seconds(3600)));

        assert_eq!(compat.name(), "lti_tool2_state-abc");
        assert_eq!(compat.same_site(), None);
        assert_eq!(compat.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn matching_cookie_validates() {
        let [primary, _] = state_cookies("state-abc");
        let jar = CookieJar::new().add(primary);

        assert!(validate_state(Some("state-abc"), &jar).is_ok());
    }

    #[test]
    fn compat_cookie_alone_validates() {
        // GIVEN: a browser that dropped the SameSite=None cookie
        let [_, compat] = state_cookies("state-abc");
        let jar = CookieJar::new().add(compat);

        // THEN: the compat cookie is enough
        assert!(validate_state(Some("state-abc"), &jar).is_ok());
    }

    #[test]
    fn missing_cookie_is_rejected() {
        let err = validate_state(Some("state-abc"), &CookieJar::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn mismatched_cookie_value_is_rejected() {
        // GIVEN: a cookie named for the submitted state but holding another value
        let jar = CookieJar::new().add(Cookie::new("lti_tool_state-abc", "state-other"));

        let err = validate_state(Some("state-abc"), &jar).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: state not found");
    }

    #[test]
    fn empty_cookie_and_missing_state_are_rejected() {
        let jar = CookieJar::new().add(Cookie::new("lti_tool_state-abc", ""));
        assert!(validate_state(Some("state-abc"), &jar).is_err());
        assert!(validate_state(None, &jar).is_err());
        assert!(validate_state(Some(""), &jar).is_err());
    }
}
