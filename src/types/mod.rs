//! Core domain types.
//!
//! Newtype identifiers shared by the webhook model, the classification engine,
//! and the GitHub client.

pub mod ids;

pub use ids::{DeliveryId, PrNumber, RepoId, Sha};
