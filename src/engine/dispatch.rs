//! Action dispatch and execution.
//!
//! [`dispatch`] drives one delivery end to end: classify, claim, resolve,
//! execute, finalize. Failure isolation is per action: one action's failure
//! never aborts sibling actions or other intents, with the single exception
//! of authentication failures, which poison every further platform call for
//! this delivery and abort it.

use tracing::{debug, info, warn};

use crate::effects::{Action, ActionInterpreter, ErrorKind, PlatformFailure};
use crate::webhooks::PullRequestEvent;

use super::classify::{classify, Intent};
use super::guard::{IdempotencyGuard, IdempotencyKey};
use super::resolve::{resolve, ResolveContext};
use super::retry::{execute_with_retry, RetryConfig};

/// Outcome of dispatching one delivery.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Actions executed successfully, in execution order.
    pub executed: Vec<Action>,

    /// Intents skipped because another delivery already claimed them.
    pub skipped: Vec<Intent>,

    /// Actions that failed, with the failure category.
    pub failed: Vec<(Action, ErrorKind)>,
}

impl DispatchResult {
    /// Returns true if the delivery produced no work at all.
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Dispatches one pull request event.
///
/// Intents are processed in classifier-emission order; actions within one
/// intent execute sequentially in resolver-emission order. Each action is a
/// single platform call (no batching, no reordering across intents). Claims
/// are finalized once an intent's action sequence completes, success or not,
/// so a redelivery cannot re-run a sequence that already failed terminally.
/// If the dispatch future is dropped mid-sequence, the unfinalized claim is
/// released and a redelivery can retry the transition.
pub async fn dispatch<C>(
    client: &C,
    guard: &IdempotencyGuard,
    event: &PullRequestEvent,
    ctx: &ResolveContext,
    retry: RetryConfig,
) -> DispatchResult
where
    C: ActionInterpreter + Sync,
{
    let mut result = DispatchResult::default();

    for intent in classify(event) {
        let key = IdempotencyKey::new(event.repo.clone(), event.pr_number, intent);

        let Some(claim) = guard.try_claim(&key) else {
            debug!(key = %key, "duplicate transition, skipping");
            result.skipped.push(intent);
            continue;
        };

        let actions = resolve(intent, event, ctx);
        let mut aborted = false;

        for action in actions {
            if action.missing_target() {
                // The payload never carried the ref/sha this action needs;
                // record the absence instead of issuing a doomed call.
                warn!(key = %key, action = action.kind(), "action target missing from payload");
                result.failed.push((action, ErrorKind::NotFound));
                continue;
            }

            match execute_with_retry(retry, || client.interpret(action.clone())).await {
                Ok(()) => {
                    info!(key = %key, action = action.kind(), "action executed");
                    result.executed.push(action);
                }
                Err(e) => {
                    let kind = e.kind();
                    warn!(key = %key, action = action.kind(), error = %e, "action failed");
                    result.failed.push((action, kind));

                    if kind.is_fatal() {
                        aborted = true;
                        break;
                    }
                }
            }
        }

        // Finalized regardless of per-action failures, bounding retry storms.
        claim.finalize();

        if aborted {
            // Auth is broken for this delivery; intents not yet claimed stay
            // unclaimed so a redelivery can pick them up.
            warn!(key = %key, "authentication failure, aborting dispatch");
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::StatusState;
    use crate::types::{PrNumber, RepoId, Sha};
    use crate::webhooks::PrAction;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("mock platform failure: {kind:?}")]
    struct MockError {
        kind: ErrorKind,
    }

    impl PlatformFailure for MockError {
        fn kind(&self) -> ErrorKind {
            self.kind
        }
    }

    /// Scriptable interpreter: fails configured action kinds, records the rest.
    #[derive(Default)]
    struct MockClient {
        executed: Mutex<Vec<Action>>,
        fail_always: Mutex<HashMap<&'static str, ErrorKind>>,
        fail_once: Mutex<HashMap<&'static str, ErrorKind>>,
    }

    impl MockClient {
        fn failing(kind: &'static str, error: ErrorKind) -> Self {
            let client = MockClient::default();
            client.fail_always.lock().unwrap().insert(kind, error);
            client
        }

        fn failing_once(kind: &'static str, error: ErrorKind) -> Self {
            let client = MockClient::default();
            client.fail_once.lock().unwrap().insert(kind, error);
            client
        }

        fn executed(&self) -> Vec<Action> {
            self.executed.lock().unwrap().clone()
        }
    }

    impl ActionInterpreter for MockClient {
        type Error = MockError;

        async fn interpret(&self, action: Action) -> Result<(), MockError> {
            if let Some(kind) = self.fail_once.lock().unwrap().remove(action.kind()) {
                return Err(MockError { kind });
            }
            if let Some(kind) = self.fail_always.lock().unwrap().get(action.kind()) {
                return Err(MockError { kind: *kind });
            }
            self.executed.lock().unwrap().push(action);
            Ok(())
        }
    }

    fn event(action: PrAction) -> PullRequestEvent {
        PullRequestEvent {
            repo: RepoId::new("acme", "widgets"),
            action,
            pr_number: PrNumber(42),
            author_login: "newdev".to_string(),
            title: "add feature".to_string(),
            head_branch: Some("feature-1".to_string()),
            merged: false,
            author_is_first_time_contributor: false,
        }
    }

    fn ctx() -> ResolveContext {
        ResolveContext {
            head_sha: Some(Sha::new("a".repeat(40))),
            wip_label_active: false,
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 1,
            initial_delay: std::time::Duration::from_millis(1),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn no_intents_is_a_noop() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();

        let result = dispatch(&client, &guard, &event(PrAction::Other), &ctx(), fast_retry()).await;

        assert!(result.is_noop());
        assert!(client.executed().is_empty());
    }

    #[tokio::test]
    async fn first_pr_executes_comment_and_label() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Opened);
        e.author_is_first_time_contributor = true;

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert_eq!(result.executed.len(), 2);
        assert!(result.skipped.is_empty());
        assert!(result.failed.is_empty());
        assert!(matches!(client.executed()[0], Action::Comment { .. }));
        assert!(matches!(client.executed()[1], Action::AddLabel { .. }));
    }

    #[tokio::test]
    async fn redelivery_is_skipped() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Opened);
        e.author_is_first_time_contributor = true;

        let first = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;
        let second = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert_eq!(first.executed.len(), 2);
        assert!(second.executed.is_empty());
        assert_eq!(second.skipped, vec![Intent::FirstPrOpened]);
        // The platform saw exactly one comment and one label
        assert_eq!(client.executed().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_deliveries_execute_exactly_once() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Opened);
        e.author_is_first_time_contributor = true;

        let c = ctx();
        let (a, b) = tokio::join!(
            dispatch(&client, &guard, &e, &c, fast_retry()),
            dispatch(&client, &guard, &e, &c, fast_retry()),
        );

        assert_eq!(a.executed.len() + b.executed.len(), 2);
        assert_eq!(a.skipped.len() + b.skipped.len(), 1);
        assert_eq!(client.executed().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_delivery_does_not_suppress_redelivery() {
        // Interpreter whose calls never complete, standing in for a dispatch
        // that is dropped mid-flight when the requesting client goes away.
        struct StalledClient;

        impl ActionInterpreter for StalledClient {
            type Error = MockError;

            async fn interpret(&self, _action: Action) -> Result<(), MockError> {
                std::future::pending().await
            }
        }

        let guard = IdempotencyGuard::default();
        let e = event(PrAction::Closed);

        let resolve_ctx = ctx();
        let attempt = dispatch(&StalledClient, &guard, &e, &resolve_ctx, fast_retry());
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(20), attempt).await;
        assert!(outcome.is_err());
        // The dropped dispatch released its claim
        assert!(guard.is_empty());

        let healthy = MockClient::default();
        let result = dispatch(&healthy, &guard, &e, &ctx(), fast_retry()).await;
        assert!(result.skipped.is_empty());
        assert_eq!(result.executed.len(), 1);
        assert!(matches!(result.executed[0], Action::Comment { .. }));
    }

    #[tokio::test]
    async fn deleted_branch_fails_delete_but_comment_still_lands() {
        // Merged PR whose head branch is already gone server-side
        let client = MockClient::failing("delete_ref", ErrorKind::NotFound);
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Closed);
        e.merged = true;

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert_eq!(result.executed.len(), 1);
        assert!(matches!(result.executed[0], Action::Comment { .. }));
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].1, ErrorKind::NotFound);
        assert!(matches!(result.failed[0].0, Action::DeleteRef { .. }));
    }

    #[tokio::test]
    async fn missing_ref_is_recorded_without_a_platform_call() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Closed);
        e.merged = true;
        e.head_branch = None;

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert!(result.executed.is_empty());
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].1, ErrorKind::NotFound);
        assert!(client.executed().is_empty());
    }

    #[tokio::test]
    async fn per_action_failure_does_not_block_siblings() {
        let client = MockClient::failing("comment", ErrorKind::Unknown);
        let guard = IdempotencyGuard::default();
        let mut e = event(PrAction::Opened);
        e.author_is_first_time_contributor = true;

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        // Comment failed, label still executed
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.executed.len(), 1);
        assert!(matches!(result.executed[0], Action::AddLabel { .. }));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_and_succeeds() {
        let client = MockClient::failing_once("comment", ErrorKind::Timeout);
        let guard = IdempotencyGuard::default();
        let e = event(PrAction::Closed);

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert!(result.failed.is_empty());
        assert_eq!(result.executed.len(), 1);
    }

    #[tokio::test]
    async fn auth_failure_aborts_remaining_intents() {
        let client = MockClient::failing("comment", ErrorKind::AuthFailure);
        let guard = IdempotencyGuard::default();
        // merged + edited non-WIP title: PrMergedCleanup then WipCleared
        let mut e = event(PrAction::Edited);
        e.merged = true;

        let result = dispatch(&client, &guard, &e, &ctx(), fast_retry()).await;

        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].1, ErrorKind::AuthFailure);
        assert!(result.executed.is_empty());
        // WipCleared was never attempted and never claimed: a redelivery
        // with working auth picks it up, while the finalized cleanup claim
        // stays skipped.
        let healthy = MockClient::default();
        let retry_result = dispatch(&healthy, &guard, &e, &ctx(), fast_retry()).await;
        assert_eq!(retry_result.skipped, vec![Intent::PrMergedCleanup]);
        assert!(retry_result
            .executed
            .iter()
            .any(|a| matches!(a, Action::SetStatus { state, .. } if *state == StatusState::Success)));
    }

    #[tokio::test]
    async fn wip_toggle_detect_then_clear() {
        let client = MockClient::default();
        let guard = IdempotencyGuard::default();

        let mut wip = event(PrAction::Edited);
        wip.title = "WIP: add feature".to_string();
        let detect = dispatch(&client, &guard, &wip, &ctx(), fast_retry()).await;
        assert!(detect
            .executed
            .iter()
            .any(|a| matches!(a, Action::SetStatus { state, .. } if *state == StatusState::Pending)));

        let cleared_event = event(PrAction::Edited);
        let clear = dispatch(&client, &guard, &cleared_event, &ctx(), fast_retry()).await;
        assert!(clear
            .executed
            .iter()
            .any(|a| matches!(a, Action::SetStatus { state, .. } if *state == StatusState::Success)));
    }
}
