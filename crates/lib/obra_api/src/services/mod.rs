//! Business logic behind the HTTP handlers.

pub mod auth;
pub mod client;
pub mod cookies;
pub mod users;

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Await a fallible write whose failure must not fail the request.
///
/// Errors are logged at `warn` and swallowed.
pub async fn best_effort<F, T, E>(operation: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, error = %e, "best-effort write failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn best_effort_swallows_errors() {
        let ok = best_effort("ok", async { Ok::<_, String>(7) }).await;
        assert_eq!(ok, Some(7));
        let failed = best_effort("fail", async { Err::<u8, _>("boom".to_string()) }).await;
        assert_eq!(failed, None);
    }
}
