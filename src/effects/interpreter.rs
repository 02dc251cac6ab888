//! Interpreter and context-resolution traits.
//!
//! These traits are the seams between the pure engine and the network. The
//! octocrab-backed implementations live in [`crate::github`]; tests substitute
//! mocks.
//!
//! # Example (mock for testing)
//!
//! ```ignore
//! struct MockClient {
//!     executed: Mutex<Vec<Action>>,
//! }
//!
//! impl ActionInterpreter for MockClient {
//!     type Error = MockError;
//!
//!     async fn interpret(&self, action: Action) -> Result<(), Self::Error> {
//!         self.executed.lock().unwrap().push(action);
//!         Ok(())
//!     }
//! }
//! ```

use std::future::Future;

use crate::types::{PrNumber, RepoId, Sha};

use super::{Action, ErrorKind};

/// A platform call failure that can be categorized for dispatch decisions.
pub trait PlatformFailure: std::error::Error + Send + Sync + 'static {
    /// The category of this failure.
    fn kind(&self) -> ErrorKind;
}

/// Executes [`Action`]s against the platform.
///
/// Implementations are constructed for a single repository, so actions don't
/// carry repo info. Each `interpret` call is a single platform call with a
/// bounded timeout; the executor owns retry policy, so implementations must
/// not retry internally.
pub trait ActionInterpreter {
    /// The error type returned by this interpreter.
    type Error: PlatformFailure;

    /// Execute one action.
    fn interpret(&self, action: Action) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Read-side queries used to resolve dispatch context ahead of execution.
///
/// The resolver is pure; anything it needs from the platform (the head SHA
/// behind a ref, the PR's labels, the author's issue count) is fetched through
/// this trait by the caller and passed in as data.
pub trait RepoContext {
    /// The error type returned by queries.
    type Error: PlatformFailure;

    /// Resolves a fully-qualified git ref (e.g. `heads/feature-1`) to the SHA
    /// it points at. Absence of the ref is a `NotFound` error, not a panic.
    fn ref_sha(&self, git_ref: &str) -> impl Future<Output = Result<Sha, Self::Error>> + Send;

    /// Lists the label names currently on a PR.
    fn labels(&self, pr: PrNumber)
        -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// Counts issues (PRs included) created by the given login in this
    /// repository. Used to resolve first-time-contributor status: a count of 1
    /// means the just-opened PR is the author's first.
    fn issues_created_by(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}

/// Produces an authenticated, repo-scoped client per delivery.
///
/// Token acquisition happens here, not in a process-wide singleton: each
/// delivery gets a short-lived handle, so there is no shared mutable client
/// state to invalidate.
pub trait ClientFactory: Clone + Send + Sync + 'static {
    /// The repo-scoped client this factory produces.
    type Client: ActionInterpreter + RepoContext + Send + Sync;

    /// The error type for authentication/installation failures.
    type Error: PlatformFailure;

    /// Returns a client authenticated for the given repository.
    fn repo_client(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<Self::Client, Self::Error>> + Send;
}
