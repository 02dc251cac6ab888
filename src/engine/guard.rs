//! Idempotency guard for logical transitions.
//!
//! GitHub may redeliver webhooks for the same logical event (with fresh
//! delivery IDs), and distinct deliveries can race. The guard tracks which
//! `(repo, pr, intent)` transitions have been actioned within the process's
//! operating window and hands out atomic claims so at most one action sequence
//! runs per transition.
//!
//! # Claim lifecycle
//!
//! - [`IdempotencyGuard::try_claim`] atomically inserts an in-flight claim and
//!   returns a [`Claim`] handle, or rejects if one exists (in-flight or
//!   already actioned). A rejected delivery is a duplicate and is skipped.
//! - [`Claim::finalize`] flips the claim to actioned once the action sequence
//!   has completed (success or terminal failure alike), to bound retry storms.
//! - Dropping a [`Claim`] without finalizing releases the entry. A dispatch
//!   that is cancelled mid-flight (the request future dropped on client
//!   disconnect, say) therefore frees the transition immediately rather than
//!   suppressing it until the entry expires.
//!
//! # TTL-based expiration
//!
//! Actioned entries older than the retention period (default 24 hours) are
//! pruned to bound memory; redelivery typically happens within seconds to
//! minutes, so exactly-once here is best-effort, not a hard guarantee.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::types::{PrNumber, RepoId};

use super::classify::Intent;

/// Default TTL for guard entries (24 hours).
pub const DEFAULT_CLAIM_TTL_HOURS: i64 = 24;

/// Identifies one logical transition for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub repo: RepoId,
    pub pr: PrNumber,
    pub intent: Intent,
}

impl IdempotencyKey {
    pub fn new(repo: RepoId, pr: PrNumber, intent: Intent) -> Self {
        IdempotencyKey { repo, pr, intent }
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.repo, self.pr, self.intent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimState {
    /// A dispatch holds the claim; its action sequence is running.
    InFlight,
    /// The action sequence completed (successfully or not).
    Actioned,
}

#[derive(Debug, Clone, Copy)]
struct ClaimEntry {
    state: ClaimState,
    claimed_at: DateTime<Utc>,
}

/// A successfully claimed transition.
///
/// The holder must call [`finalize`](Claim::finalize) once its action
/// sequence completes. If the handle is dropped instead, the claim is
/// released and the transition becomes claimable again.
#[must_use = "an unfinalized claim is released on drop"]
pub struct Claim<'g> {
    guard: &'g IdempotencyGuard,
    key: IdempotencyKey,
    done: bool,
}

impl Claim<'_> {
    /// Marks the transition as actioned; duplicates are rejected until the
    /// entry expires.
    pub fn finalize(self) {
        self.finalize_at(Utc::now());
    }

    fn finalize_at(mut self, now: DateTime<Utc>) {
        self.done = true;
        self.guard.mark_actioned(&self.key, now);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.guard.release(&self.key);
        }
    }
}

impl std::fmt::Debug for Claim<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claim")
            .field("key", &self.key)
            .field("done", &self.done)
            .finish()
    }
}

/// Tracks claims per logical transition. The only shared mutable state in the
/// engine; safe under concurrent deliveries.
#[derive(Debug)]
pub struct IdempotencyGuard {
    entries: Mutex<HashMap<IdempotencyKey, ClaimEntry>>,
    ttl: Duration,
}

impl Default for IdempotencyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CLAIM_TTL_HOURS)
    }
}

impl IdempotencyGuard {
    /// Creates a guard whose entries expire after `ttl_hours`.
    pub fn new(ttl_hours: i64) -> Self {
        IdempotencyGuard {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Atomically claims a transition, or rejects it as a duplicate.
    ///
    /// Returns a [`Claim`] handle if the caller now owns the transition.
    /// Returns `None` if another dispatch is in flight for the same key, or
    /// the transition was already actioned within the TTL.
    pub fn try_claim(&self, key: &IdempotencyKey) -> Option<Claim<'_>> {
        self.try_claim_at(key, Utc::now())
    }

    fn try_claim_at(&self, key: &IdempotencyKey, now: DateTime<Utc>) -> Option<Claim<'_>> {
        let mut entries = self.entries.lock().expect("guard mutex poisoned");
        match entries.get(key) {
            Some(entry) if now - entry.claimed_at < self.ttl => None,
            _ => {
                entries.insert(
                    key.clone(),
                    ClaimEntry {
                        state: ClaimState::InFlight,
                        claimed_at: now,
                    },
                );
                Some(Claim {
                    guard: self,
                    key: key.clone(),
                    done: false,
                })
            }
        }
    }

    fn mark_actioned(&self, key: &IdempotencyKey, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("guard mutex poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.state = ClaimState::Actioned;
            entry.claimed_at = now;
        }
    }

    fn release(&self, key: &IdempotencyKey) {
        let mut entries = self.entries.lock().expect("guard mutex poisoned");
        // Only an in-flight entry belongs to the dropped holder; an actioned
        // one may have been written by a later claimant after TTL expiry.
        if let Some(entry) = entries.get(key) {
            if entry.state == ClaimState::InFlight {
                entries.remove(key);
            }
        }
    }

    /// Prunes entries older than the TTL. Returns the number pruned.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now())
    }

    fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().expect("guard mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now - entry.claimed_at < self.ttl);
        before - entries.len()
    }

    /// Number of tracked entries (for observability).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("guard mutex poisoned").len()
    }

    /// Returns true if no entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
