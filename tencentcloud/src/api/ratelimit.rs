//! Per-action request rate limiting.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 20;

const WINDOW: Duration = Duration::from_secs(1);

/// Fixed one-second windows, counted separately for every API action.
/// A limit of zero disables limiting.
pub struct RateLimiter {
    limit: u32,
    windows: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request slot for `action` is free and takes it.
    pub async fn check(&self, action: &str) {
        if self.limit == 0 {
            return;
        }

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let window = windows.entry(action.to_string()).or_insert(Window {
                    started: now,
                    count: 0,
                });
                if now.duration_since(window.started) >= WINDOW {
                    window.started = now;
                    window.count = 0;
                }
                if window.count < self.limit {
                    window.count += 1;
                    None
                } else {
                    Some(WINDOW.saturating_sub(now.duration_since(window.started)))
                }
            };

            match wait {
                None => return,
                Some(wait) => {
                    tracing::debug!(action, "rate limit reached, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_SECOND)
    }
}
