//! PR Steward - a GitHub bot that shepherds pull requests through their
//! lifecycle: greeting first-time contributors, acknowledging closures,
//! cleaning up merged branches, and gating WIP-titled PRs behind a commit
//! status.
//!
//! The crate is split along one seam: everything in [`engine`] and
//! [`effects`] is pure or mock-backed data flow, while [`github`] holds the
//! only code that talks to the network.

pub mod config;
pub mod effects;
pub mod engine;
pub mod github;
pub mod server;
pub mod types;
pub mod webhooks;
