//! Intent-to-action resolution.
//!
//! [`resolve`] maps each [`Intent`] to the concrete [`Action`]s that realize
//! it. It is pure: everything it needs from the platform (the head commit SHA,
//! whether the hold label is set) arrives in [`ResolveContext`], resolved by
//! the caller ahead of time.

use crate::effects::{Action, StatusState};
use crate::types::Sha;
use crate::webhooks::PullRequestEvent;

use super::classify::Intent;

/// The commit status context under which WIP state is reported.
pub const WIP_STATUS_CONTEXT: &str = "wip-check";

/// The label added to newly opened first PRs.
pub const NEEDS_REVIEW_LABEL: &str = "needs review";

/// Platform-derived inputs the resolver needs.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// SHA the PR's head ref currently points at. `None` when the event
    /// carried no head ref or the branch no longer exists; resolution still
    /// proceeds, and actions that need the SHA fail individually downstream.
    pub head_sha: Option<Sha>,

    /// Whether the PR currently carries the WIP hold label. An explicit hold
    /// suppresses auto-clearing of the WIP status.
    pub wip_label_active: bool,
}

/// Resolves one intent into its action sequence.
///
/// Actions are emitted in execution order. An empty sequence means the intent
/// requires no side effects under the given context.
pub fn resolve(intent: Intent, event: &PullRequestEvent, ctx: &ResolveContext) -> Vec<Action> {
    match intent {
        Intent::FirstPrOpened => vec![
            Action::Comment {
                pr: event.pr_number,
                body: format!(
                    "Thanks for opening this pull request, @{}! \
                     The repository maintainers will look into it ASAP! :speech_balloon:",
                    event.author_login
                ),
            },
            Action::AddLabel {
                pr: event.pr_number,
                name: NEEDS_REVIEW_LABEL.to_string(),
            },
        ],

        Intent::PrClosed => vec![Action::Comment {
            pr: event.pr_number,
            body: format!(
                "Thank you for your contribution, {}.\nYour pull request is now closed",
                event.author_login
            ),
        }],

        Intent::PrMergedCleanup => match event.head_ref() {
            Some(git_ref) => vec![
                Action::Comment {
                    pr: event.pr_number,
                    body: format!("Delete branch {}", git_ref),
                },
                Action::DeleteRef {
                    git_ref: Some(git_ref),
                },
            ],
            // No ref in the payload: emit the deletion anyway so the missing
            // target surfaces as a recorded not-found failure, not silence.
            None => vec![Action::DeleteRef { git_ref: None }],
        },

        Intent::WipDetected => wip_status_actions(event, ctx, StatusState::Pending, |sha| {
            format!("Your commit {} is pending", sha)
        }),

        Intent::WipCleared => {
            if ctx.wip_label_active {
                // An explicit hold label suppresses auto-clearing.
                Vec::new()
            } else {
                wip_status_actions(event, ctx, StatusState::Success, |sha| {
                    format!("Success for {}", sha)
                })
            }
        }
    }
}

fn wip_status_actions(
    event: &PullRequestEvent,
    ctx: &ResolveContext,
    state: StatusState,
    comment: impl Fn(&Sha) -> String,
) -> Vec<Action> {
    let mut actions = vec![Action::SetStatus {
        sha: ctx.head_sha.clone(),
        state,
        context: WIP_STATUS_CONTEXT.to_string(),
    }];
    // The comment names the commit; without a SHA there is nothing coherent
    // to say, and the SetStatus above already records the missing target.
    if let Some(sha) = &ctx.head_sha {
        actions.push(Action::Comment {
            pr: event.pr_number,
            body: comment(sha),
        });
    }
    actions
}
