//! Backend endpoint resolution.
//!
//! Decides which base URL the client talks to for the current
//! environment and refuses anything that is not plain `http`/`https`.
//! There is deliberately no hard-coded production fallback: a production
//! build with no configured backend fails loudly instead of quietly
//! calling an address it should not.

use std::env;

use crate::consts::{DEV_ENDPOINT, ENV_API_BASE, ENV_MODE};
use crate::error::{JobError, Result};

/// Which environment the client believes it is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Read the mode from `WAYFARER_ENV`. Anything other than
    /// `development`/`dev` counts as production.
    pub fn from_env() -> Self {
        match env::var(ENV_MODE).ok().as_deref() {
            Some("development") | Some("dev") => Mode::Development,
            _ => Mode::Production,
        }
    }
}

/// A validated backend base URL.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: String,
    /// Non-fatal warning raised during resolution (e.g. loopback host
    /// outside development). The caller decides whether to surface it.
    pub advisory: Option<String>,
}

impl Endpoint {
    /// Resolve the backend base URL.
    ///
    /// Priority: explicit URL argument, then `WAYFARER_API_BASE`, then
    /// the local development endpoint (development mode only).
    pub fn resolve(explicit: Option<&str>, mode: Mode) -> Result<Self> {
        let configured = explicit
            .map(str::to_string)
            .or_else(|| env::var(ENV_API_BASE).ok().filter(|v| !v.trim().is_empty()));

        match configured {
            Some(url) => Self::validate(url.trim(), mode),
            None if mode == Mode::Development => Ok(Self {
                base: DEV_ENDPOINT.to_string(),
                advisory: None,
            }),
            None => Err(JobError::InvalidEndpoint(
                "no backend configured; set WAYFARER_API_BASE".to_string(),
            )),
        }
    }

    fn validate(url: &str, mode: Mode) -> Result<Self> {
        // Schemes are case-insensitive; the prefix is ASCII so byte
        // offsets are safe.
        let lower = url.to_lowercase();
        let rest = if lower.starts_with("https://") {
            &url["https://".len()..]
        } else if lower.starts_with("http://") {
            &url["http://".len()..]
        } else {
            let scheme = url.split(':').next().unwrap_or(url);
            return Err(JobError::InvalidEndpoint(format!(
                "disallowed scheme \"{}\" in \"{}\"",
                scheme, url
            )));
        };

        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or("")
            .rsplit('@')
            .next()
            .unwrap_or("");
        // Bracketed IPv6 literals carry their own colons; strip the
        // brackets instead of splitting on the port separator.
        let hostname = if let Some(v6) = host.strip_prefix('[') {
            v6.split(']').next().unwrap_or("").to_lowercase()
        } else {
            host.split(':').next().unwrap_or("").to_lowercase()
        };
        if hostname.is_empty() {
            return Err(JobError::InvalidEndpoint(format!("no host in \"{}\"", url)));
        }

        // Consistent concatenation later: no trailing slashes.
        let base = url.trim_end_matches('/').to_string();

        let advisory = if mode != Mode::Development && is_local_host(&hostname) {
            Some(format!(
                "backend host \"{}\" is local/loopback outside development",
                hostname
            ))
        } else {
            None
        };

        Ok(Self { base, advisory })
    }

    /// The base URL, without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Join a path (expected to start with `/`) onto the base.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Loopback and any-local hosts that usually mean "my own machine".
fn is_local_host(hostname: &str) -> bool {
    matches!(hostname, "127.0.0.1" | "::1" | "0.0.0.0" | "localhost")
}
