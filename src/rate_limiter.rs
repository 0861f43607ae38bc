//! Sliding-window limiter for sign-in attempts.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::{CrmError, CrmResult};

struct Attempts {
    by_client: HashMap<String, Vec<Instant>>,
    last_sweep: Instant,
}

impl Attempts {
    /// Drops clients whose every attempt has left the window.
    fn sweep(&mut self, now: Instant, window: Duration) {
        self.by_client.retain(|_, times| {
            times.retain(|&t| now.duration_since(t) < window);
            !times.is_empty()
        });
        self.last_sweep = now;
    }
}

pub struct RateLimiter {
    attempts: RwLock<Attempts>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_seconds: u64) -> Self {
        Self {
            attempts: RwLock::new(Attempts {
                by_client: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            max_attempts,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Keys are case-insensitive so `Ana@x` and `ana@x` share one budget.
    fn key(client_id: &str) -> String {
        client_id.trim().to_lowercase()
    }

    /// Records an attempt, or fails with `RateLimited` once the window is full.
    /// Expired clients are swept at most once per window.
    pub async fn check(&self, client_id: &str) -> CrmResult<()> {
        let mut attempts = self.attempts.write().await;
        let now = Instant::now();
        if now.duration_since(attempts.last_sweep) >= self.window {
            attempts.sweep(now, self.window);
            tracing::debug!(tracked = attempts.by_client.len(), "sign-in limiter swept");
        }

        let entry = attempts.by_client.entry(Self::key(client_id)).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);
        if entry.len() >= self.max_attempts {
            tracing::warn!(client = %client_id, "sign-in rate limit reached");
            return Err(CrmError::rate_limited(
                "too many sign-in attempts, try again later",
            ));
        }
        entry.push(now);
        Ok(())
    }

    /// Forget a client's attempts, e.g. after a successful sign-in.
    pub async fn reset(&self, client_id: &str) {
        self.attempts
            .write()
            .await
            .by_client
            .remove(&Self::key(client_id));
    }
}
