//! Pull request webhook payload parser.
//!
//! Lifts raw webhook JSON into a typed [`PullRequestEvent`]. The parser is
//! deliberately lenient about optional fields (`Option<T>` in the raw structs,
//! validated explicitly) and strict about the identity fields: a payload
//! without repository owner/name or PR number is rejected, never half-parsed.
//!
//! # Returns
//!
//! * `Ok(Some(event))` - a pull request payload the engine should classify
//! * `Ok(None)` - well-formed but not a pull request payload (ignored)
//! * `Err(_)` - payload is malformed or missing identity fields

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PrNumber, RepoId};

use super::events::{PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload has no `repository` object (or it lacks owner/name).
    ///
    /// The endpoint treats this as "nothing to do", mirroring GitHub's ping
    /// and app-lifecycle deliveries that omit repository context.
    #[error("missing repository information in payload")]
    MissingRepository,

    /// A required field is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

// Raw payload structures. These match GitHub's webhook JSON shape; everything
// non-identity is optional so a sparse payload degrades to explicit absence
// instead of a deserialization error.

#[derive(Debug, Deserialize)]
struct RawPayload {
    repository: Option<RawRepository>,
    action: Option<String>,
    pull_request: Option<RawPullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: Option<RawOwner>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    title: Option<String>,
    merged: Option<bool>,
    head: Option<RawRef>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

/// Parses a webhook payload into a typed pull request event.
pub fn parse_pull_request_event(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPayload = serde_json::from_slice(payload)?;

    let repo = extract_repository(&raw)?;

    // Deliveries without a pull_request object (issues, pushes, ...) are not
    // ours to handle.
    let Some(pr) = raw.pull_request else {
        return Ok(None);
    };

    let pr_number = pr
        .number
        .map(PrNumber)
        .ok_or(ParseError::MissingField("pull_request.number"))?;

    let action = match raw.action.as_deref() {
        Some("opened") => PrAction::Opened,
        Some("closed") => PrAction::Closed,
        Some("edited") => PrAction::Edited,
        _ => PrAction::Other,
    };

    Ok(Some(PullRequestEvent {
        repo,
        action,
        pr_number,
        author_login: pr.user.map(|u| u.login).unwrap_or_default(),
        title: pr.title.unwrap_or_default(),
        head_branch: pr.head.and_then(|h| h.ref_name),
        merged: pr.merged.unwrap_or(false),
        author_is_first_time_contributor: false,
    }))
}

fn extract_repository(raw: &RawPayload) -> Result<RepoId, ParseError> {
    let repository = raw.repository.as_ref().ok_or(ParseError::MissingRepository)?;
    let owner = repository
        .owner
        .as_ref()
        .map(|o| o.login.clone())
        .ok_or(ParseError::MissingRepository)?;
    let name = repository
        .name
        .clone()
        .ok_or(ParseError::MissingRepository)?;
    Ok(RepoId::new(owner, name))
}
