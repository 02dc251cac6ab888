//! Typed pull request webhook events.
//!
//! [`PullRequestEvent`] is the normalized view of an incoming delivery: only
//! the fields the classification engine consumes, with absence made explicit
//! instead of crashing at use sites. A `closed`-without-merge payload carries
//! no usable head ref, and a merged PR's head branch may already be gone, so
//! `head_branch` is optional throughout.

use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, RepoId};

/// Action performed on a pull request.
///
/// Only the actions the engine reacts to are distinguished; everything else
/// (assigned, labeled, review_requested, ...) collapses to [`PrAction::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR was closed (merged or not).
    Closed,
    /// PR was edited (title, body, or base branch changed).
    Edited,
    /// Any other action; never produces intents on its own.
    Other,
}

/// A normalized pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The repository.
    pub repo: RepoId,

    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub pr_number: PrNumber,

    /// The PR author's login name.
    pub author_login: String,

    /// The PR title, used for WIP marker detection.
    pub title: String,

    /// The head branch name (the PR's source branch), if the payload carried one.
    pub head_branch: Option<String>,

    /// Whether the PR was merged. Only meaningful for `closed` payloads, but
    /// GitHub also sets it on the final `closed` delivery of a merge.
    pub merged: bool,

    /// Whether this is the author's first PR in the repository.
    ///
    /// Not part of the raw payload; resolved externally (via the platform
    /// client) before classification. The parser always sets it to `false`.
    pub author_is_first_time_contributor: bool,
}

impl PullRequestEvent {
    /// Returns the fully-qualified git ref for the head branch, e.g.
    /// `heads/feature-1`.
    pub fn head_ref(&self) -> Option<String> {
        self.head_branch.as_ref().map(|b| format!("heads/{}", b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pr_action_json_format() {
        assert_eq!(
            serde_json::to_string(&PrAction::Opened).unwrap(),
            "\"opened\""
        );
        assert_eq!(
            serde_json::to_string(&PrAction::Closed).unwrap(),
            "\"closed\""
        );
        assert_eq!(
            serde_json::to_string(&PrAction::Edited).unwrap(),
            "\"edited\""
        );
    }

    #[test]
    fn head_ref_is_fully_qualified() {
        let event = PullRequestEvent {
            repo: RepoId::new("acme", "widgets"),
            action: PrAction::Closed,
            pr_number: PrNumber(42),
            author_login: "octocat".to_string(),
            title: "add feature".to_string(),
            head_branch: Some("feature-1".to_string()),
            merged: true,
            author_is_first_time_contributor: false,
        };
        assert_eq!(event.head_ref().as_deref(), Some("heads/feature-1"));
    }

    #[test]
    fn head_ref_absent_when_branch_missing() {
        let event = PullRequestEvent {
            repo: RepoId::new("acme", "widgets"),
            action: PrAction::Closed,
            pr_number: PrNumber(42),
            author_login: "octocat".to_string(),
            title: "add feature".to_string(),
            head_branch: None,
            merged: false,
            author_is_first_time_contributor: false,
        };
        assert_eq!(event.head_ref(), None);
    }
}
