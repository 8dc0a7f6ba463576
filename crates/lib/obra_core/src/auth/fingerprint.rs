//! User-Agent fingerprint used to bind a refresh token to the browser that
//! received it. Not a secret: the value is readable by client script.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Length of the truncated fingerprint.
const FINGERPRINT_LEN: usize = 32;

/// SHA-256 of the User-Agent, base64url-encoded and truncated.
pub fn ua_fingerprint(user_agent: &str) -> String {
    let digest = Sha256::digest(user_agent.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Whether a fingerprint cookie value matches the current User-Agent.
pub fn fingerprint_matches(cookie: Option<&str>, user_agent: &str) -> bool {
    match cookie {
        Some(value) if !value.is_empty() => value == ua_fingerprint(user_agent),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

    #[test]
    fn fingerprint_is_stable_and_truncated() {
        let a = ua_fingerprint(UA);
        assert_eq!(a, ua_fingerprint(UA));
        assert_eq!(a.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn different_agents_differ() {
        assert_ne!(ua_fingerprint(UA), ua_fingerprint("curl/8.5.0"));
    }

    #[test]
    fn missing_or_altered_cookie_does_not_match() {
        assert!(fingerprint_matches(Some(&ua_fingerprint(UA)), UA));
        assert!(!fingerprint_matches(None, UA));
        assert!(!fingerprint_matches(Some(""), UA));
        assert!(!fingerprint_matches(Some(&ua_fingerprint("curl/8.5.0")), UA));
    }
}
