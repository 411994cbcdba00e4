//! Project-wide constants.

use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Environment variable naming the backend base URL.
pub const ENV_API_BASE: &str = "WAYFARER_API_BASE";

/// Environment variable selecting `development` or `production` mode.
pub const ENV_MODE: &str = "WAYFARER_ENV";

/// Backend endpoint used in development when nothing is configured.
pub const DEV_ENDPOINT: &str = "http://127.0.0.1:8000";

/// First poll happens after this interval.
pub const POLL_START_INTERVAL: Duration = Duration::from_millis(1000);

/// The poll interval grows by this much per iteration.
pub const POLL_INTERVAL_STEP: Duration = Duration::from_millis(500);

/// The poll interval never exceeds this.
pub const POLL_INTERVAL_CAP: Duration = Duration::from_millis(3000);

/// Whole-flow deadline measured from submission.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Per-call HTTP timeout inside the transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport attempts per logical request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay the transport scales its backoff from.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// New jobs allowed per identity per window.
pub const RATE_LIMIT_QUOTA: u32 = 20;

/// Length of the rate-limit window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Destination length cap after sanitization.
pub const MAX_DESTINATION_LEN: usize = 100;

/// Per-interest length cap after sanitization.
pub const MAX_INTEREST_LEN: usize = 50;

/// Currency code length cap after sanitization.
pub const MAX_CURRENCY_LEN: usize = 5;

/// Travelers clamp to `1..=MAX_TRAVELERS`.
pub const MAX_TRAVELERS: u32 = 12;

/// Trip duration clamps to `1..=MAX_DURATION_DAYS`.
pub const MAX_DURATION_DAYS: u32 = 30;

/// Hard ceiling for the daily budget cap.
pub const MAX_DAILY_BUDGET: f64 = 100_000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consts_are_non_empty() {
        assert!(!AUTHOR.is_empty());
        assert!(!HOMEPAGE.is_empty());
        assert!(!REPO.is_empty());
        assert!(!DEV_ENDPOINT.is_empty());
    }

    #[test]
    fn poll_interval_bounds_are_sane() {
        assert!(POLL_START_INTERVAL <= POLL_INTERVAL_CAP);
        assert!(POLL_INTERVAL_STEP > Duration::ZERO);
    }

    #[test]
    fn clamp_bounds_are_sane() {
        assert!(MAX_TRAVELERS >= 1);
        assert!(MAX_DURATION_DAYS >= 1);
        assert!(MAX_DAILY_BUDGET > 0.0);
    }
}
