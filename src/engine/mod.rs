//! The event classification and action-dispatch engine.
//!
//! Pipeline for one delivery:
//!
//! ```text
//! PullRequestEvent ──► classify ──► Intents
//!                                      │ try_claim (idempotency guard)
//!                                      ▼
//!                                   resolve ──► Actions ──► execute ──► finalize claim
//! ```
//!
//! Classification and resolution are pure; the guard is the only shared
//! mutable state; execution isolates failures per action.

pub mod classify;
pub mod dispatch;
pub mod guard;
pub mod resolve;
pub mod retry;

pub use classify::{classify, Intent};
pub use dispatch::{dispatch, DispatchResult};
pub use guard::{Claim, IdempotencyGuard, IdempotencyKey};
pub use resolve::{resolve, ResolveContext};
pub use retry::{execute_with_retry, RetryConfig};
