//! Cookie service: set/clear the session cookies.
//!
//! `auth-token` and `refresh-token` are httpOnly. `rf-ua` is readable by
//! client script; it only carries the User-Agent fingerprint.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "auth-token";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refresh-token";
/// Cookie name for the User-Agent fingerprint.
pub const UA_COOKIE: &str = "rf-ua";

fn build(
    name: &'static str,
    value: String,
    http_only: bool,
    secure: bool,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(http_only)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// httpOnly cookie for the access token.
pub fn access_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    build(
        ACCESS_COOKIE,
        token.to_string(),
        true,
        secure,
        Duration::seconds(max_age_secs),
    )
}

/// httpOnly cookie for the refresh token.
pub fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    build(
        REFRESH_COOKIE,
        token.to_string(),
        true,
        secure,
        Duration::seconds(max_age_secs),
    )
}

/// Script-readable fingerprint cookie; lives as long as the refresh token.
pub fn ua_cookie(fingerprint: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    build(
        UA_COOKIE,
        fingerprint.to_string(),
        false,
        secure,
        Duration::seconds(max_age_secs),
    )
}

/// Expired, empty access cookie.
pub fn clear_access_cookie(secure: bool) -> Cookie<'static> {
    build(ACCESS_COOKIE, String::new(), true, secure, Duration::ZERO)
}

/// Expired, empty refresh cookie.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    build(REFRESH_COOKIE, String::new(), true, secure, Duration::ZERO)
}

/// Expired, empty fingerprint cookie.
pub fn clear_ua_cookie(secure: bool) -> Cookie<'static> {
    build(UA_COOKIE, String::new(), false, secure, Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookies_are_http_only_and_lax() {
        let c = access_cookie("tok", 3600, true);
        assert_eq!(c.name(), ACCESS_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.max_age(), Some(Duration::hours(1)));
        assert_eq!(refresh_cookie("tok", 60, false).http_only(), Some(true));
    }

    #[test]
    fn fingerprint_cookie_is_script_readable() {
        assert_eq!(ua_cookie("fp", 60, false).http_only(), Some(false));
    }

    #[test]
    fn cleared_cookies_are_empty_with_zero_age() {
        for c in [
            clear_access_cookie(false),
            clear_refresh_cookie(false),
            clear_ua_cookie(false),
        ] {
            assert_eq!(c.value(), "");
            assert_eq!(c.max_age(), Some(Duration::ZERO));
        }
    }
}
