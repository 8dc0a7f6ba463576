//! JWT token generation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Identity stamped into every token.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl From<&TokenClaims> for TokenSubject {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            id: claims.sub.clone(),
            email: claims.email.clone(),
            role: claims.rol.clone(),
        }
    }
}

/// HS256 signer/verifier for access and refresh tokens sharing one secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec with the default lifetime for each token kind.
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign an access token with the default access lifetime.
    pub fn sign_access(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.sign(subject, TokenKind::Access, self.access_ttl)
    }

    /// Sign a refresh token with the default refresh lifetime.
    pub fn sign_refresh(&self, subject: &TokenSubject) -> Result<String, AuthError> {
        self.sign(subject, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Sign a token of `kind` expiring `lifetime` from now.
    ///
    /// A negative lifetime produces a token that is already expired.
    pub fn sign(
        &self,
        subject: &TokenSubject,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.id.clone(),
            email: subject.email.clone(),
            rol: subject.role.clone(),
            kind,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature, algorithm and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    /// Verify and additionally require the `type` claim to equal `kind`.
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            return Err(AuthError::InvalidToken);
        }
        if is_expired(Some(claims.exp)) {
            return Err(AuthError::ExpiredToken);
        }
        Ok(claims)
    }
}

/// Whether an `exp` claim has elapsed. A missing `exp` counts as expired.
pub fn is_expired(exp: Option<i64>) -> bool {
    is_expired_at(exp, Utc::now().timestamp())
}

/// [`is_expired`] against an explicit clock (unix seconds).
pub fn is_expired_at(exp: Option<i64>, now: i64) -> bool {
    match exp {
        Some(exp) => exp <= now,
        None => true,
    }
}

/// Seconds left before `claims` expire, floored at zero.
pub fn remaining_secs(claims: &TokenClaims) -> i64 {
    (claims.exp - Utc::now().timestamp()).max(0)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET`.
///
/// There is no fallback: a missing or short secret is an error and the
/// caller must refuse to start.
pub fn resolve_jwt_secret() -> Result<String, AuthError> {
    let secret = ["JWT_SECRET", "AUTH_SECRET"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
        .ok_or_else(|| AuthError::ValidationError("JWT_SECRET is not set".into()))?;
    validate_secret(&secret)?;
    Ok(secret)
}

/// Reject secrets shorter than [`MIN_SECRET_LEN`].
pub fn validate_secret(secret: &str) -> Result<(), AuthError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(AuthError::ValidationError(format!(
            "JWT secret must be at least {MIN_SECRET_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-for-hs256";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(1), Duration::days(2))
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            id: "0b6c3f0e-6f1c-4d55-9c1e-1a2b3c4d5e6f".into(),
            email: "ana@example.com".into(),
            role: "vendedor".into(),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let codec = codec();
        let token = codec.sign_access(&subject()).unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, subject().id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.rol, "vendedor");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_round_trip() {
        let codec = codec();
        let token = codec.sign_refresh(&subject()).unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, Duration::days(2).num_seconds());
    }

    #[test]
    fn tokens_minted_together_differ() {
        let codec = codec();
        let a = codec.sign_refresh(&subject()).unwrap();
        let b = codec.sign_refresh(&subject()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_token_fails_verification() {
        let codec = codec();
        let token = codec
            .sign(&subject(), TokenKind::Access, Duration::seconds(-1))
            .unwrap();
        assert!(matches!(codec.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().sign_access(&subject()).unwrap();
        let other = TokenCodec::new(
            b"another-secret-that-is-long-enough-too",
            Duration::hours(1),
            Duration::days(2),
        );
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(
            codec().verify("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn verify_kind_rejects_the_other_type() {
        let codec = codec();
        let refresh = codec.sign_refresh(&subject()).unwrap();
        assert!(matches!(
            codec.verify_kind(&refresh, TokenKind::Access),
            Err(AuthError::InvalidToken)
        ));
        assert!(codec.verify_kind(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn is_expired_fails_closed() {
        assert!(is_expired(None));
        assert!(is_expired_at(Some(99), 100));
        assert!(is_expired_at(Some(100), 100));
        assert!(!is_expired_at(Some(101), 100));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(validate_secret("short").is_err());
        assert!(validate_secret(std::str::from_utf8(SECRET).unwrap()).is_ok());
    }
}
