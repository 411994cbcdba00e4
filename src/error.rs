//! Error taxonomy for the job client.
//!
//! Every failure a flow can surface maps to exactly one variant, so
//! callers can branch on kind instead of string-matching messages.

use thiserror::Error;

/// Result type alias for job flows.
pub type Result<T> = std::result::Result<T, JobError>;

/// Classification of a transport-level failure, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// TLS/certificate problems.
    Tls,
    /// Cross-origin / CORS-style rejections.
    CrossOrigin,
    /// Everything else: DNS, connection reset, timeouts.
    Generic,
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkKind::Tls => write!(f, "tls"),
            NetworkKind::CrossOrigin => write!(f, "cross-origin"),
            NetworkKind::Generic => write!(f, "network"),
        }
    }
}

/// Everything that can go wrong between submitting a trip request and
/// receiving an itinerary.
#[derive(Debug, Error)]
pub enum JobError {
    /// Request rejected before any network call (e.g. empty destination).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The local admission gate denied a new job for this identity.
    #[error("rate limited: too many jobs started, try again shortly")]
    RateLimited,

    /// No usable backend base URL for this environment.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The create-job call returned non-2xx or a body without a job id.
    #[error("job submission failed: {0}")]
    SubmissionFailed(String),

    /// A poll returned a non-2xx response.
    #[error("poll failed with HTTP {status}: {message}")]
    PollFailed { status: u16, message: String },

    /// The backend reported the job itself as failed.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// The backend claimed success but sent no usable result payload.
    #[error("job succeeded but the response carried no result")]
    MissingResult,

    /// The wall-clock deadline for the whole flow elapsed.
    #[error("timed out waiting for the job to complete")]
    TimedOut,

    /// The caller cancelled the flow through its token.
    #[error("cancelled")]
    Cancelled,

    /// Transport retries exhausted or a non-retriable transport error.
    #[error("{kind} failure: {message}")]
    NetworkFailure { kind: NetworkKind, message: String },
}

impl JobError {
    /// Classify a transport error message into a [`NetworkKind`].
    pub fn classify_network(message: &str) -> NetworkKind {
        let lower = message.to_lowercase();
        if lower.contains("tls") || lower.contains("certificate") || lower.contains("ssl") {
            NetworkKind::Tls
        } else if lower.contains("cors") || lower.contains("cross-origin") {
            NetworkKind::CrossOrigin
        } else {
            NetworkKind::Generic
        }
    }

    /// Build a [`JobError::NetworkFailure`] from a raw transport message.
    pub fn network(message: impl Into<String>) -> Self {
        let message = message.into();
        JobError::NetworkFailure {
            kind: Self::classify_network(&message),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = JobError::PollFailed {
            status: 503,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "poll failed with HTTP 503: upstream down");

        let err = JobError::InvalidEndpoint("bad scheme".to_string());
        assert!(err.to_string().contains("bad scheme"));
    }

    #[test]
    fn classify_tls_messages() {
        assert_eq!(
            JobError::classify_network("TLS handshake failed"),
            NetworkKind::Tls
        );
        assert_eq!(
            JobError::classify_network("invalid peer certificate"),
            NetworkKind::Tls
        );
    }

    #[test]
    fn classify_cross_origin_messages() {
        assert_eq!(
            JobError::classify_network("blocked by CORS policy"),
            NetworkKind::CrossOrigin
        );
    }

    #[test]
    fn classify_everything_else_as_generic() {
        assert_eq!(
            JobError::classify_network("dns error: no such host"),
            NetworkKind::Generic
        );
        assert_eq!(JobError::classify_network(""), NetworkKind::Generic);
    }

    #[test]
    fn network_constructor_carries_kind() {
        let err = JobError::network("ssl verify failed");
        match err {
            JobError::NetworkFailure { kind, message } => {
                assert_eq!(kind, NetworkKind::Tls);
                assert_eq!(message, "ssl verify failed");
            }
            _ => panic!("expected NetworkFailure"),
        }
    }
}
