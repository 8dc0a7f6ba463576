//! Token-bucket rate limiting for auth endpoints.
//!
//! Buckets live in process memory, so each instance limits independently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// Bucket parameters.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub refill_interval: Duration,
    pub refill_amount: u32,
}

impl RateLimitConfig {
    /// Login: 5 attempts per minute.
    pub const fn login() -> Self {
        Self {
            capacity: 5,
            refill_interval: Duration::from_secs(60),
            refill_amount: 5,
        }
    }

    /// Refresh: 20 rotations per minute.
    pub const fn refresh() -> Self {
        Self {
            capacity: 20,
            refill_interval: Duration::from_secs(60),
            refill_amount: 20,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Keyed token-bucket limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Try to spend one token for `key`.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// [`allow`](Self::allow) against an explicit clock.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let cfg = self.config;
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });

        let interval_ms = cfg.refill_interval.as_millis().max(1);
        let elapsed_ms = now.saturating_duration_since(bucket.last_refill).as_millis();
        let intervals = elapsed_ms / interval_ms;
        if intervals > 0 {
            let credit = intervals.saturating_mul(u128::from(cfg.refill_amount));
            let tokens = (u128::from(bucket.tokens) + credit).min(u128::from(cfg.capacity));
            bucket.tokens = u32::try_from(tokens).unwrap_or(cfg.capacity);
            // Advance by whole intervals only so partial progress is kept.
            let advance = u32::try_from(intervals)
                .ok()
                .and_then(|n| cfg.refill_interval.checked_mul(n));
            bucket.last_refill = match advance {
                Some(d) => bucket.last_refill + d,
                None => now,
            };
        }

        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }

    /// Drop buckets that would be full again by `now`.
    pub fn cleanup_at(&self, now: Instant) {
        let cfg = self.config;
        let per_refill = cfg.refill_amount.max(1);
        let refills_to_full = cfg.capacity.div_ceil(per_refill);
        let idle = cfg.refill_interval.saturating_mul(refills_to_full);
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_refill) < idle);
    }

    /// Spawn a periodic cleanup task that stops when `ct` is cancelled.
    pub fn spawn_cleanup_task(
        self: &Arc<Self>,
        ct: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = ct.cancelled() => break,
                    _ = interval.tick() => limiter.cleanup_at(Instant::now()),
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
