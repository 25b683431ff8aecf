//! Vote ledger
//!
//! Reconciles a click on an upvote/downvote control with what the voter has
//! already recorded on the target:
//!
//! - same direction already recorded: the click retracts it
//! - otherwise: the click casts it, clearing the opposite direction in the same
//!   store update
//!
//! A vote without an authenticated voter is silently ignored.

use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::PathInvalidator;
use crate::model::{VoteChange, VoteDirection, VoteState, VoteTarget};
use crate::store::ForumStore;
use crate::types::Result;

/// Decide the store change for a click given the voter's recorded state
pub fn reconcile(direction: VoteDirection, current: VoteState) -> VoteChange {
    if current.has(direction) {
        VoteChange::Retract(direction)
    } else {
        VoteChange::Cast(direction)
    }
}

pub struct VoteLedger {
    store: Arc<dyn ForumStore>,
    invalidator: Arc<dyn PathInvalidator>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn ForumStore>, invalidator: Arc<dyn PathInvalidator>) -> Self {
        Self { store, invalidator }
    }

    /// Apply a vote click and invalidate the page showing the counts
    ///
    /// `current` is the state the caller rendered. Even when it is stale a
    /// cast removes the opposite direction, so the voter never ends up in both
    /// sets.
    pub async fn apply_vote(
        &self,
        target: VoteTarget,
        voter: Option<&ObjectId>,
        direction: VoteDirection,
        current: VoteState,
        path: &str,
    ) -> Result<()> {
        let Some(voter) = voter else {
            debug!(target = %target, "Vote without a voter ignored");
            return Ok(());
        };

        let change = reconcile(direction, current);
        self.store.update_votes(&target, voter, change).await?;
        self.invalidator.invalidate(path);

        info!(
            target = %target,
            voter = %voter.to_hex(),
            ?change,
            "Vote applied"
        );
        Ok(())
    }

    /// Recorded state of a voter on a target
    pub async fn state(&self, target: &VoteTarget, voter: &ObjectId) -> Result<VoteState> {
        self.store.vote_state(target, voter).await
    }
}
