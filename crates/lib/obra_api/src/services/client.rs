//! Client identity as seen by the rate limiter and the UA binding.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

/// IP and User-Agent of the calling client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
}

impl ClientContext {
    /// Read the client from proxy headers. The first `X-Forwarded-For` hop
    /// wins, then `X-Real-IP`; otherwise the IP is `unknown`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip"))
            .unwrap_or("unknown")
            .to_string();
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Self { ip, user_agent }
    }

    /// Rate-limiter key: ip + UA, plus the email when there is one.
    pub fn rate_key(&self, email: Option<&str>) -> String {
        match email {
            Some(email) => format!("{}|{}|{}", self.ip, self.user_agent, email.to_lowercase()),
            None => format!("{}|{}", self.ip, self.user_agent),
        }
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn first_forwarded_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));
        let client = ClientContext::from_headers(&headers);
        assert_eq!(client.ip, "203.0.113.9");
        assert_eq!(client.user_agent, "test-agent");
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(ClientContext::from_headers(&headers).ip, "10.0.0.2");
        assert_eq!(ClientContext::from_headers(&HeaderMap::new()).ip, "unknown");
    }

    #[test]
    fn rate_key_includes_lowercased_email() {
        let client = ClientContext {
            ip: "1.2.3.4".into(),
            user_agent: "ua".into(),
        };
        assert_eq!(client.rate_key(Some("Ana@X.com")), "1.2.3.4|ua|ana@x.com");
        assert_eq!(client.rate_key(None), "1.2.3.4|ua");
    }
}
