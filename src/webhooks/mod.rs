//! Webhook handling for GitHub pull request events.
//!
//! This module provides the typed payload model and the parser that lifts raw
//! webhook JSON into it. Intent classification happens downstream in
//! [`crate::engine`].

pub mod events;
pub mod parser;

pub use events::{PrAction, PullRequestEvent};
pub use parser::{parse_pull_request_event, ParseError};
