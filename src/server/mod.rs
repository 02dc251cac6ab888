//! HTTP server for the PR steward.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (always 204)
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::effects::ClientFactory;
use crate::engine::{IdempotencyGuard, RetryConfig};

/// Shared application state, passed to handlers via axum's `State`
/// extractor.
pub struct AppState<F> {
    inner: Arc<AppStateInner<F>>,
}

// Manual impl: deriving would also require F: Clone on the *inner* field,
// which the Arc makes unnecessary.
impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<F> {
    /// Produces authenticated repo-scoped clients per delivery.
    factory: F,

    /// Claims processed (repo, PR, intent) transitions.
    guard: IdempotencyGuard,

    /// Label whose presence on a PR suppresses automatic WIP clearing.
    hold_label: String,

    /// Retry policy handed to the dispatcher.
    retry: RetryConfig,
}

impl<F: ClientFactory> AppState<F> {
    /// Creates application state.
    ///
    /// `guard_ttl_hours` bounds how long a claimed transition blocks
    /// redeliveries.
    pub fn new(factory: F, hold_label: impl Into<String>, guard_ttl_hours: i64) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                factory,
                guard: IdempotencyGuard::new(guard_ttl_hours),
                hold_label: hold_label.into(),
                retry: RetryConfig::DEFAULT,
            }),
        }
    }

    /// Returns the client factory.
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    /// Returns the idempotency guard.
    pub fn guard(&self) -> &IdempotencyGuard {
        &self.inner.guard
    }

    /// Returns the WIP hold label name.
    pub fn hold_label(&self) -> &str {
        &self.inner.hold_label
    }

    /// Returns the dispatch retry policy.
    pub fn retry(&self) -> RetryConfig {
        self.inner.retry
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<F: ClientFactory>(app_state: AppState<F>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<F>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
