//! Actions-as-data for platform side effects.
//!
//! An [`Action`] describes a single GitHub API operation without executing it.
//! The resolver produces actions as pure data; interpreters (the octocrab
//! client in [`crate::github`], mocks in tests) execute them. This keeps the
//! classification and resolution logic testable without network mocks, and
//! makes intended operations loggable.
//!
//! Actions are repo-scoped: the interpreter is constructed for one repository,
//! so actions don't carry repo info.

use serde::{Deserialize, Serialize};

pub mod interpreter;

pub use interpreter::{ActionInterpreter, ClientFactory, PlatformFailure, RepoContext};

use crate::types::{PrNumber, Sha};

/// Commit status states (GitHub Status API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    /// Check is pending.
    Pending,
    /// Check succeeded.
    Success,
    /// Check failed.
    Failure,
    /// Check errored.
    Error,
}

impl StatusState {
    /// Returns the GitHub API string for this state.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Failure => "failure",
            StatusState::Error => "error",
        }
    }
}

/// A single platform side effect, as data.
///
/// Actions carry no network behavior. `SetStatus` and `DeleteRef` hold their
/// target as an `Option`: a payload may legitimately lack the head ref (e.g.
/// the branch was already deleted), in which case the resolver still emits the
/// action and the executor records a not-found failure for it instead of
/// crashing or suppressing sibling actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Post a comment on a PR conversation.
    Comment { pr: PrNumber, body: String },

    /// Add a label to a PR.
    AddLabel { pr: PrNumber, name: String },

    /// Set a commit status on the head commit.
    SetStatus {
        sha: Option<Sha>,
        state: StatusState,
        context: String,
    },

    /// Delete a git ref (fully qualified, e.g. `heads/feature-1`).
    DeleteRef { git_ref: Option<String> },
}

impl Action {
    /// Returns true if this action needs a ref/sha the event didn't carry.
    ///
    /// Such actions cannot be executed; the executor fails them as not-found
    /// without issuing a platform call.
    pub fn missing_target(&self) -> bool {
        matches!(
            self,
            Action::SetStatus { sha: None, .. } | Action::DeleteRef { git_ref: None }
        )
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Comment { .. } => "comment",
            Action::AddLabel { .. } => "add_label",
            Action::SetStatus { .. } => "set_status",
            Action::DeleteRef { .. } => "delete_ref",
        }
    }
}

/// Categorization of a platform call failure, for dispatch decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced ref/commit/PR does not exist. Skip the action, continue
    /// siblings.
    NotFound,
    /// Rate limited. Eligible for one bounded retry.
    RateLimited,
    /// Token/installation failure. Fatal for the whole dispatch.
    AuthFailure,
    /// Network timeout. Eligible for one bounded retry.
    Timeout,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Returns true if a bounded retry is worthwhile.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Timeout)
    }

    /// Returns true if the failure poisons the rest of the dispatch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::AuthFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_state_api_strings() {
        assert_eq!(StatusState::Pending.as_api_str(), "pending");
        assert_eq!(StatusState::Success.as_api_str(), "success");
        assert_eq!(StatusState::Failure.as_api_str(), "failure");
        assert_eq!(StatusState::Error.as_api_str(), "error");
    }

    #[test]
    fn missing_target_detection() {
        assert!(Action::DeleteRef { git_ref: None }.missing_target());
        assert!(Action::SetStatus {
            sha: None,
            state: StatusState::Pending,
            context: "wip-check".to_string(),
        }
        .missing_target());

        assert!(!Action::DeleteRef {
            git_ref: Some("heads/feature-1".to_string())
        }
        .missing_target());
        assert!(!Action::Comment {
            pr: PrNumber(1),
            body: "hi".to_string()
        }
        .missing_target());
    }

    #[test]
    fn retriable_kinds() {
        assert!(ErrorKind::RateLimited.is_retriable());
        assert!(ErrorKind::Timeout.is_retriable());
        assert!(!ErrorKind::NotFound.is_retriable());
        assert!(!ErrorKind::AuthFailure.is_retriable());
        assert!(!ErrorKind::Unknown.is_retriable());
    }

    #[test]
    fn fatal_kinds() {
        assert!(ErrorKind::AuthFailure.is_fatal());
        assert!(!ErrorKind::Timeout.is_fatal());
        assert!(!ErrorKind::NotFound.is_fatal());
    }

    #[test]
    fn action_serde_uses_snake_case_tags() {
        let action = Action::AddLabel {
            pr: PrNumber(7),
            name: "needs review".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "add_label");
    }
}
