//! Sliding fixed-window admission control.
//!
//! Bounds how often one caller identity may start new jobs. Denial is
//! decided locally, before any network call, so a throttled caller
//! never burns transport retries.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::consts::{RATE_LIMIT_QUOTA, RATE_LIMIT_WINDOW};

struct Window {
    count: u32,
    reset_at: Instant,
}

/// Per-identity admission gate. Safe to share across flows.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    quota: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            quota,
            window,
        }
    }

    /// May `identity` start a new job right now?
    ///
    /// First call in a fresh or expired window resets the count and
    /// allows; within an active window, allows while under quota.
    pub fn admit(&self, identity: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();

        match windows.get_mut(identity) {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.quota {
                    return false;
                }
                window.count += 1;
                true
            }
            _ => {
                windows.insert(
                    identity.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Forget an identity's window (e.g. after an operator override).
    pub fn reset(&self, identity: &str) {
        self.windows.lock().unwrap().remove(identity);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_QUOTA, RATE_LIMIT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_admission_allowed() {
        let limiter = RateLimiter::default();
        assert!(limiter.admit("alice"));
    }

    #[test]
    fn quota_exhaustion_denies_the_next_call() {
        let limiter = RateLimiter::new(20, Duration::from_secs(60));
        for i in 0..20 {
            assert!(limiter.admit("alice"), "call {} should be admitted", i + 1);
        }
        assert!(!limiter.admit("alice"), "21st call should be denied");
    }

    #[test]
    fn identities_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.admit("alice"));
        assert!(!limiter.admit("alice"));
        assert!(limiter.admit("bob"));
    }

    #[test]
    fn expired_window_resets_and_allows() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.admit("alice"));
        assert!(!limiter.admit("alice"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.admit("alice"));
        assert!(!limiter.admit("alice"));
    }

    #[test]
    fn reset_clears_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.admit("alice"));
        assert!(!limiter.admit("alice"));
        limiter.reset("alice");
        assert!(limiter.admit("alice"));
    }

    #[test]
    fn concurrent_admissions_never_exceed_quota() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(20, Duration::from_secs(60)));
        let handles: Vec<_> = (0..40)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.admit("shared"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(admitted, 20);
    }
}
