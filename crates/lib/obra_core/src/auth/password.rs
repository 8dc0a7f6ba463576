//! Password hashing via bcrypt.

use std::sync::LazyLock;

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest accepted password.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Hash checked when there is no account to check against, so a login for
/// an unknown or inactive account costs the same as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("obra-dummy-password", BCRYPT_COST).ok());

/// Run a full-cost bcrypt verification whose result is discarded.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = bcrypt::verify(password, hash);
    }
}

/// Check the password length is within `[6, 128]` characters.
pub fn validate_password_length(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AuthError::ValidationError(format!(
            "La contraseña debe tener entre {MIN_PASSWORD_LEN} y {MAX_PASSWORD_LEN} caracteres"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("secreto123").unwrap();
        assert!(verify_password("secreto123", &hash).unwrap());
        assert!(!verify_password("otro-secreto", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("secreto123", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn dummy_hash_uses_the_login_cost() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash");
        assert!(hash.starts_with("$2b$10$"));
        verify_dummy("anything");
    }

    #[test]
    fn length_bounds() {
        assert!(validate_password_length("12345").is_err());
        assert!(validate_password_length("123456").is_ok());
        assert!(validate_password_length(&"x".repeat(128)).is_ok());
        assert!(validate_password_length(&"x".repeat(129)).is_err());
    }
}
