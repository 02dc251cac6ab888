//! Payload-to-intent classification.
//!
//! [`classify`] is the single place that derives semantic transitions from a
//! payload. It is pure, total, and deterministic: no I/O, no clock, no
//! global state. Call sites never re-derive intent from raw payload fields.

use serde::{Deserialize, Serialize};

use crate::webhooks::{PrAction, PullRequestEvent};

/// Title markers that flag a PR as work-in-progress (matched
/// case-insensitively).
pub const WIP_MARKERS: [&str; 3] = ["wip", "work in progress", "do not merge"];

/// A semantic transition derived from a payload.
///
/// Multiple intents may coexist for one payload (e.g. a merged PR whose final
/// `closed` delivery yields both cleanup and a WIP clear). "No intent" is the
/// empty sequence from [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// A first-time contributor opened a PR.
    FirstPrOpened,
    /// A PR was closed without being merged.
    PrClosed,
    /// A PR was merged; its head branch should be cleaned up.
    PrMergedCleanup,
    /// The title marks the PR as work-in-progress.
    WipDetected,
    /// An edit removed the WIP markers from the title.
    WipCleared,
}

impl Intent {
    /// Short name for logging and idempotency keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::FirstPrOpened => "first_pr_opened",
            Intent::PrClosed => "pr_closed",
            Intent::PrMergedCleanup => "pr_merged_cleanup",
            Intent::WipDetected => "wip_detected",
            Intent::WipCleared => "wip_cleared",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if the title carries a WIP marker.
pub fn is_wip_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    WIP_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classifies a payload into its semantic transitions.
///
/// Rules are evaluated independently; emission order is fixed and matches the
/// declaration order below, which the dispatcher relies on. A missing head ref
/// does not suppress any intent: actions that need the ref fail individually
/// at the executor.
pub fn classify(event: &PullRequestEvent) -> Vec<Intent> {
    let mut intents = Vec::new();

    if event.action == PrAction::Opened && event.author_is_first_time_contributor {
        intents.push(Intent::FirstPrOpened);
    }

    if event.action == PrAction::Closed && !event.merged {
        intents.push(Intent::PrClosed);
    }

    // Merged cleanup keys off the merged flag alone: GitHub delivers the merge
    // as a `closed` action, but redeliveries may arrive with other actions.
    if event.merged {
        intents.push(Intent::PrMergedCleanup);
    }

    let wip = is_wip_title(&event.title);
    if wip && matches!(event.action, PrAction::Opened | PrAction::Edited) {
        intents.push(Intent::WipDetected);
    }

    if event.action == PrAction::Edited && !wip {
        intents.push(Intent::WipCleared);
    }

    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrNumber, RepoId};
    use proptest::prelude::*;

    fn event(action: PrAction, title: &str) -> PullRequestEvent {
        PullRequestEvent {
            repo: RepoId::new("acme", "widgets"),
            action,
            pr_number: PrNumber(42),
            author_login: "octocat".to_string(),
            title: title.to_string(),
            head_branch: Some("feature-1".to_string()),
            merged: false,
            author_is_first_time_contributor: false,
        }
    }

    #[test]
    fn first_pr_opened_requires_first_time_author() {
        let mut e = event(PrAction::Opened, "add feature");
        e.author_is_first_time_contributor = true;
        assert_eq!(classify(&e), vec![Intent::FirstPrOpened]);

        e.author_is_first_time_contributor = false;
        assert_eq!(classify(&e), Vec::<Intent>::new());
    }

    #[test]
    fn closed_without_merge_yields_pr_closed() {
        let e = event(PrAction::Closed, "add feature");
        assert_eq!(classify(&e), vec![Intent::PrClosed]);
    }

    #[test]
    fn closed_with_merge_yields_cleanup_not_pr_closed() {
        let mut e = event(PrAction::Closed, "add feature");
        e.merged = true;
        assert_eq!(classify(&e), vec![Intent::PrMergedCleanup]);
    }

    #[test]
    fn merged_flag_alone_yields_cleanup() {
        // Redeliveries may carry merged=true under a non-closed action
        let mut e = event(PrAction::Other, "add feature");
        e.merged = true;
        assert_eq!(classify(&e), vec![Intent::PrMergedCleanup]);
    }

    #[test]
    fn wip_title_on_open_yields_wip_detected() {
        let e = event(PrAction::Opened, "WIP: add feature");
        assert_eq!(classify(&e), vec![Intent::WipDetected]);
    }

    #[test]
    fn wip_markers_are_case_insensitive() {
        for title in ["wip stuff", "Work In Progress", "DO NOT MERGE yet"] {
            let e = event(PrAction::Edited, title);
            assert_eq!(classify(&e), vec![Intent::WipDetected], "title: {title}");
        }
    }

    #[test]
    fn edited_without_wip_marker_yields_wip_cleared() {
        let e = event(PrAction::Edited, "add feature");
        assert_eq!(classify(&e), vec![Intent::WipCleared]);
    }

    #[test]
    fn wip_marker_on_closed_action_yields_nothing_for_wip() {
        // WIP detection only applies to opened/edited
        let e = event(PrAction::Closed, "WIP: add feature");
        assert_eq!(classify(&e), vec![Intent::PrClosed]);
    }

    #[test]
    fn missing_head_branch_does_not_suppress_intents() {
        let mut e = event(PrAction::Closed, "add feature");
        e.merged = true;
        e.head_branch = None;
        assert_eq!(classify(&e), vec![Intent::PrMergedCleanup]);
    }

    #[test]
    fn other_action_without_merge_yields_nothing() {
        let e = event(PrAction::Other, "add feature");
        assert_eq!(classify(&e), Vec::<Intent>::new());
    }

    #[test]
    fn merged_wip_edit_yields_multiple_intents_in_fixed_order() {
        let mut e = event(PrAction::Edited, "WIP: add feature");
        e.merged = true;
        assert_eq!(
            classify(&e),
            vec![Intent::PrMergedCleanup, Intent::WipDetected]
        );
    }

    proptest! {
        /// classify is deterministic: calling it twice yields identical output.
        #[test]
        fn classify_is_deterministic(
            action_idx in 0usize..4,
            title in "[a-zA-Z ]{0,40}",
            merged: bool,
            first_time: bool,
        ) {
            let actions = [PrAction::Opened, PrAction::Closed, PrAction::Edited, PrAction::Other];
            let mut e = event(actions[action_idx], &title);
            e.merged = merged;
            e.author_is_first_time_contributor = first_time;

            prop_assert_eq!(classify(&e), classify(&e));
        }

        /// A single payload never yields duplicate intents.
        #[test]
        fn classify_never_duplicates(
            action_idx in 0usize..4,
            title in "(WIP )?[a-z ]{0,30}",
            merged: bool,
            first_time: bool,
        ) {
            let actions = [PrAction::Opened, PrAction::Closed, PrAction::Edited, PrAction::Other];
            let mut e = event(actions[action_idx], &title);
            e.merged = merged;
            e.author_is_first_time_contributor = first_time;

            let intents = classify(&e);
            let mut deduped = intents.clone();
            deduped.dedup();
            prop_assert_eq!(intents, deduped);
        }

        /// WipDetected and WipCleared are mutually exclusive.
        #[test]
        fn wip_intents_are_exclusive(title in ".{0,60}") {
            let e = event(PrAction::Edited, &title);
            let intents = classify(&e);
            let detected = intents.contains(&Intent::WipDetected);
            let cleared = intents.contains(&Intent::WipCleared);
            prop_assert!(!(detected && cleared));
            // An edit always resolves to one of the two
            prop_assert!(detected || cleared);
        }
    }
}
