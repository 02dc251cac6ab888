//! GitHub API error types.
//!
//! Every octocrab failure is folded into a [`PlatformError`] carrying an
//! [`ErrorKind`], which is what the executor's retry and abort decisions
//! key off:
//!
//! - [`ErrorKind::RateLimited`] and [`ErrorKind::Timeout`] are retried once
//! - [`ErrorKind::AuthFailure`] aborts the rest of the delivery
//! - [`ErrorKind::NotFound`] and [`ErrorKind::Unknown`] fail the single
//!   action and nothing else

use std::fmt;
use thiserror::Error;

use crate::effects::{ErrorKind, PlatformFailure};

/// A categorized GitHub API error.
#[derive(Debug, Error)]
pub struct PlatformError {
    /// The failure category driving retry/abort decisions.
    pub kind: ErrorKind,

    /// The HTTP status code, if one could be recovered.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl PlatformFailure for PlatformError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl PlatformError {
    /// Creates an error of a given kind without an octocrab source.
    pub fn without_source(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a timeout error for a call that exceeded its deadline.
    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::without_source(ErrorKind::Timeout, message)
    }

    /// Categorizes a raw HTTP status, for calls made outside octocrab's
    /// typed endpoints.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ErrorKind::AuthFailure,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            _ => ErrorKind::Unknown,
        };
        Self {
            kind,
            status_code: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error.
    ///
    /// The categorization is based on HTTP status codes where one can be
    /// recovered, falling back to message patterns for network-level
    /// failures and secondary rate limits.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = extract_status_code(&err);
        let message = err.to_string();

        let kind = match status_code {
            Some(401) => ErrorKind::AuthFailure,
            Some(403) if is_rate_limit_message(&message) => ErrorKind::RateLimited,
            Some(403) => ErrorKind::AuthFailure,
            Some(404) => ErrorKind::NotFound,
            Some(429) => ErrorKind::RateLimited,
            Some(_) => ErrorKind::Unknown,
            None if is_timeout_message(&message) => ErrorKind::Timeout,
            None => ErrorKind::Unknown,
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
///
/// octocrab's `Error` type doesn't expose a stable status accessor across
/// all variants, so this parses the rendered message. The fallback of
/// `None` is safe: it categorizes as `Unknown`, which is never retried.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    let err_str = err.to_string();

    // octocrab renders errors like "GitHub API returned status: 404"
    if let Some(idx) = err_str.find("status: ") {
        let rest = &err_str[idx + 8..];
        if let Some(end) = rest.find(|c: char| !c.is_ascii_digit()) {
            if let Ok(code) = rest[..end].parse() {
                return Some(code);
            }
        } else if let Ok(code) = rest.trim().parse() {
            return Some(code);
        }
    }

    // Common phrasings that omit the "status:" prefix
    if err_str.contains("404") && err_str.to_lowercase().contains("not found") {
        return Some(404);
    }
    for code in [401u16, 403, 422, 429, 500, 502, 503] {
        if err_str.contains(&code.to_string()) {
            return Some(code);
        }
    }

    None
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_message(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level timeout.
fn is_timeout_message(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("timed out")
        || message_lower.contains("connection")
        || message_lower.contains("dns")
}
