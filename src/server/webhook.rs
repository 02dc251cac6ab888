//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries and processes pull request events
//! through the dispatch engine. The endpoint always responds 204 No
//! Content: GitHub's redelivery machinery treats non-2xx as a failure to
//! be retried, and nothing a sender can do about a bad payload warrants
//! that. Problems are logged, not surfaced to the sender.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, info, warn};

use super::AppState;
use crate::effects::{ClientFactory, RepoContext};
use crate::engine::{dispatch, ResolveContext};
use crate::types::DeliveryId;
use crate::webhooks::{parse_pull_request_event, ParseError, PrAction, PullRequestEvent};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers: `X-GitHub-Event` (event type), `X-GitHub-Delivery` (unique
///   delivery ID)
/// - Body: JSON webhook payload
///
/// # Response
///
/// Always 204 No Content. Events other than `pull_request`, payloads
/// without a `repository` object, and unparseable bodies are acknowledged
/// without processing.
pub async fn webhook_handler<F>(
    State(state): State<AppState<F>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode
where
    F: ClientFactory,
{
    let delivery = headers
        .get(HEADER_DELIVERY)
        .and_then(|v| v.to_str().ok())
        .map(DeliveryId::new)
        .unwrap_or_else(|| DeliveryId::new("<none>"));

    let event_type = headers.get(HEADER_EVENT).and_then(|v| v.to_str().ok());
    if event_type != Some("pull_request") {
        debug!(
            delivery = %delivery,
            event_type = event_type.unwrap_or("<none>"),
            "ignoring non-pull-request event"
        );
        return StatusCode::NO_CONTENT;
    }

    let event = match parse_pull_request_event(&body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery = %delivery, "payload carries no pull_request object, ignoring");
            return StatusCode::NO_CONTENT;
        }
        Err(ParseError::MissingRepository) => {
            warn!(delivery = %delivery, "payload missing repository, ignoring");
            return StatusCode::NO_CONTENT;
        }
        Err(e) => {
            warn!(delivery = %delivery, error = %e, "unparseable payload, ignoring");
            return StatusCode::NO_CONTENT;
        }
    };

    process_delivery(&state, &delivery, event).await;

    StatusCode::NO_CONTENT
}

/// Authenticates, enriches the event with platform context, and dispatches.
///
/// Failures here are logged and swallowed: the HTTP response is 204 either
/// way, and per-action failures are already isolated inside the engine.
async fn process_delivery<F>(state: &AppState<F>, delivery: &DeliveryId, mut event: PullRequestEvent)
where
    F: ClientFactory,
{
    let client = match state.factory().repo_client(&event.repo).await {
        Ok(client) => client,
        Err(e) => {
            warn!(
                delivery = %delivery,
                repo = %event.repo,
                error = %e,
                "could not authenticate for repository"
            );
            return;
        }
    };

    event.author_is_first_time_contributor = is_first_time_contributor(&client, &event).await;
    let ctx = build_context(&client, &event, state.hold_label()).await;

    let result = dispatch(&client, state.guard(), &event, &ctx, state.retry()).await;

    info!(
        delivery = %delivery,
        repo = %event.repo,
        pr = %event.pr_number,
        executed = result.executed.len(),
        skipped = result.skipped.len(),
        failed = result.failed.len(),
        "delivery processed"
    );
}

/// A just-opened PR is its author's first iff their total issue count
/// (PRs included) in this repository is exactly one. Only queried for
/// `opened` deliveries; on query failure the greeting is skipped rather
/// than risked on a repeat contributor.
async fn is_first_time_contributor<C>(client: &C, event: &PullRequestEvent) -> bool
where
    C: RepoContext,
{
    if event.action != PrAction::Opened {
        return false;
    }

    match client.issues_created_by(&event.author_login).await {
        Ok(count) => count == 1,
        Err(e) => {
            warn!(
                repo = %event.repo,
                author = %event.author_login,
                error = %e,
                "could not count author's issues, treating as returning contributor"
            );
            false
        }
    }
}

/// Fetches the platform context the resolver needs but the payload lacks.
///
/// Each lookup is scoped to the deliveries that can use it, and each
/// degrades independently: a failed SHA lookup leaves `head_sha` empty (the
/// executor records the missing target), a failed label lookup treats the
/// hold label as inactive.
async fn build_context<C>(
    client: &C,
    event: &PullRequestEvent,
    hold_label: &str,
) -> ResolveContext
where
    C: RepoContext,
{
    let needs_sha = matches!(event.action, PrAction::Opened | PrAction::Edited);
    let head_sha = match event.head_ref() {
        Some(git_ref) if needs_sha => match client.ref_sha(&git_ref).await {
            Ok(sha) => Some(sha),
            Err(e) => {
                warn!(
                    repo = %event.repo,
                    git_ref = %git_ref,
                    error = %e,
                    "could not resolve head ref"
                );
                None
            }
        },
        _ => None,
    };

    let wip_label_active = if event.action == PrAction::Edited {
        match client.labels(event.pr_number).await {
            Ok(labels) => labels.iter().any(|l| l.eq_ignore_ascii_case(hold_label)),
            Err(e) => {
                warn!(
                    repo = %event.repo,
                    pr = %event.pr_number,
                    error = %e,
                    "could not list PR labels, treating hold label as inactive"
                );
                false
            }
        }
    } else {
        false
    };

    ResolveContext {
        head_sha,
        wip_label_active,
    }
}
