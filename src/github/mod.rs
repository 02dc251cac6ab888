//! GitHub API integration.
//!
//! Wraps octocrab behind the [`crate::effects`] seams: a repo-scoped client,
//! an action interpreter, and error categorization for dispatch decisions.

pub mod client;
pub mod error;
pub mod interpreter;

pub use client::{AppClientFactory, FactoryError, OctocrabClient};
pub use error::PlatformError;
