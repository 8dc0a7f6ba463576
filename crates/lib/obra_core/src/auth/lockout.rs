//! Failed-login tracking with a rolling window and a hard lock.
//!
//! State is process-local. Once an account crosses the threshold the caller
//! flips the persisted `active` flag, which is what survives a restart.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Length of the rolling window, measured from its first attempt.
pub const WINDOW: Duration = Duration::minutes(15);

/// In-window failures that trigger deactivation.
pub const LOCK_THRESHOLD: u32 = 6;

/// In-window failure count from which the user is warned.
pub const WARNING_FROM: u32 = 3;

/// Local lock applied on deactivation; effectively permanent.
pub const HARD_LOCK: Duration = Duration::days(365);

#[derive(Debug, Clone)]
struct AttemptWindow {
    window_start: DateTime<Utc>,
    window_count: u32,
    lifetime_count: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl AttemptWindow {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            window_count: 0,
            lifetime_count: 0,
            locked_until: None,
        }
    }

    fn lock_active(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// Result of [`LockoutTracker::is_temporarily_locked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Result of [`LockoutTracker::register_failed_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub locked: bool,
    /// The account crossed the threshold and must be deactivated in the store.
    pub deactivated: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub window_count: u32,
    pub lifetime_count: u32,
}

impl AttemptOutcome {
    /// User-facing warning for this outcome, if any.
    pub fn warning(&self) -> Option<String> {
        warning_for(self.window_count)
    }
}

/// Escalating warning for in-window counts `3..=5`.
pub fn warning_for(window_count: u32) -> Option<String> {
    if !(WARNING_FROM..LOCK_THRESHOLD).contains(&window_count) {
        return None;
    }
    let left = LOCK_THRESHOLD - window_count;
    Some(if left == 1 {
        "Te queda 1 intento antes de que la cuenta sea desactivada".to_string()
    } else {
        format!("Te quedan {left} intentos antes de que la cuenta sea desactivada")
    })
}

/// Failed-attempt counters keyed by lowercased email.
#[derive(Debug, Default)]
pub struct LockoutTracker {
    windows: DashMap<String, AttemptWindow>,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl LockoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_temporarily_locked(&self, email: &str) -> LockStatus {
        self.is_temporarily_locked_at(email, Utc::now())
    }

    pub fn is_temporarily_locked_at(&self, email: &str, now: DateTime<Utc>) -> LockStatus {
        match self.windows.get(&key(email)) {
            Some(w) if w.lock_active(now) => LockStatus {
                locked: true,
                locked_until: w.locked_until,
            },
            _ => LockStatus {
                locked: false,
                locked_until: None,
            },
        }
    }

    pub fn register_failed_attempt(&self, email: &str) -> AttemptOutcome {
        self.register_failed_attempt_at(email, Utc::now())
    }

    /// Count one failure at `now`, resetting the window first if it is stale.
    pub fn register_failed_attempt_at(&self, email: &str, now: DateTime<Utc>) -> AttemptOutcome {
        let k = key(email);
        let mut entry = self
            .windows
            .entry(k.clone())
            .or_insert_with(|| AttemptWindow::fresh(now));

        if now - entry.window_start > WINDOW {
            entry.window_start = now;
            entry.window_count = 0;
        }
        entry.window_count += 1;
        entry.lifetime_count += 1;

        let deactivated = entry.window_count >= LOCK_THRESHOLD;
        if deactivated && !entry.lock_active(now) {
            entry.locked_until = Some(now + HARD_LOCK);
            warn!(email = %k, attempts = entry.window_count, "account locked after repeated failures");
        } else {
            debug!(email = %k, attempts = entry.window_count, "failed login attempt registered");
        }

        AttemptOutcome {
            locked: entry.lock_active(now),
            deactivated,
            locked_until: entry.locked_until,
            window_count: entry.window_count,
            lifetime_count: entry.lifetime_count,
        }
    }

    /// Forget all state for `email`. Called on every successful login.
    pub fn reset_attempts(&self, email: &str) {
        self.windows.remove(&key(email));
    }

    pub fn remaining_lock_duration_ms(&self, email: &str) -> Option<i64> {
        self.remaining_lock_duration_ms_at(email, Utc::now())
    }

    pub fn remaining_lock_duration_ms_at(&self, email: &str, now: DateTime<Utc>) -> Option<i64> {
        let w = self.windows.get(&key(email))?;
        let until = w.locked_until?;
        (until > now).then(|| (until - now).num_milliseconds())
    }

    /// Evict stale, unlocked windows.
    pub fn cleanup_at(&self, now: DateTime<Utc>) {
        self.windows
            .retain(|_, w| w.lock_active(now) || now - w.window_start <= WINDOW);
    }

    /// Spawn a periodic cleanup task that stops when `ct` is cancelled.
    pub fn spawn_cleanup_task(
        self: &Arc<Self>,
        ct: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = ct.cancelled() => break,
                    _ = interval.tick() => tracker.cleanup_at(Utc::now()),
                }
            }
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.windows.len()
    }
}
