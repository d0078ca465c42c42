//! # Board
//!
//! In-memory working set of referrals plus the user's vote ledger, behind the
//! operations the presentation layer calls.
//!
//! ## Voting
//!
//! 1. Ledger entry exists: `DuplicateVote`, nothing touched
//! 2. Vote on the same id already running: `VoteInFlight`
//! 3. Id not in the working set: `NotFound`
//! 4. New counts go to the store, one counter bumped by one
//! 5. Store failure: `PersistenceFailed`, working set and ledger untouched
//! 6. Store success: counts and ledger entry updated under one lock
//!
//! The store write always happens before anything local changes, so a failed
//! vote can simply be retried.
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{error, info, warn};

use crate::{
    catalog::{self, App},
    error::{StoreError, SubmitError, VoteError},
    filter::{self, Visibility},
    ledger::{LedgerStorage, VoteLedger},
    referral::{Referral, ReferralDraft, VoteDirection},
    store::ReferralStore,
};

pub struct Board<S, L> {
    store: S,
    state: Mutex<BoardState<L>>,
}

struct BoardState<L> {
    referrals: Vec<Referral>,
    ledger: VoteLedger<L>,
    in_flight: HashSet<String>,
}

/// Clears the in-flight mark on every exit path, including a dropped future.
struct InFlight<'a, L> {
    state: &'a Mutex<BoardState<L>>,
    id: String,
}

impl<L> Drop for InFlight<'_, L> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .remove(&self.id);
    }
}

impl<S, L> Board<S, L>
where
    S: ReferralStore,
    L: LedgerStorage,
{
    /// Loads the ledger right away. Referrals arrive with [`Board::initialize`].
    pub fn new(store: S, storage: L) -> Self {
        Self {
            store,
            state: Mutex::new(BoardState {
                referrals: Vec::new(),
                ledger: VoteLedger::open(storage),
                in_flight: HashSet::new(),
            }),
        }
    }

    /// Fetches the collection into the working set. Safe to call again to
    /// refresh; a failed fetch keeps whatever was loaded before.
    pub async fn initialize(&self) -> Result<usize, StoreError> {
        let referrals = self.store.list().await.inspect_err(|e| {
            warn!("Failed to load referrals: {e}");
        })?;

        let count = referrals.len();
        self.state().referrals = referrals;

        info!("Loaded {count} referrals");
        Ok(count)
    }

    pub fn get_visible(&self, selected_app: Option<&str>, show_hidden: bool) -> Visibility<Referral> {
        let state = self.state();
        let visibility = filter::visible(&state.referrals, selected_app, show_hidden);

        Visibility {
            visible: visibility.visible.into_iter().cloned().collect(),
            hidden_count: visibility.hidden_count,
        }
    }

    pub async fn vote(&self, id: &str, direction: VoteDirection) -> Result<(), VoteError> {
        let (upvotes, downvotes, _in_flight) = {
            let mut state = self.state();

            if state.ledger.has_voted(id) {
                return Err(VoteError::DuplicateVote);
            }

            if state.in_flight.contains(id) {
                return Err(VoteError::VoteInFlight);
            }

            let (upvotes, downvotes) = state
                .referrals
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| VoteError::NotFound(id.to_string()))?
                .counts_after(direction)
                .ok_or(VoteError::CounterFull)?;

            state.in_flight.insert(id.to_string());

            let guard = InFlight {
                state: &self.state,
                id: id.to_string(),
            };

            (upvotes, downvotes, guard)
        };

        self.store
            .set_votes(id, upvotes, downvotes)
            .await
            .map_err(|e| {
                warn!(id, "Failed to store vote: {e}");
                VoteError::PersistenceFailed(e)
            })?;

        let mut state = self.state();

        match state.referrals.iter_mut().find(|r| r.id == id) {
            Some(referral) => {
                referral.upvotes = upvotes;
                referral.downvotes = downvotes;
            }
            None => warn!(id, "Referral left the working set while voting"),
        }

        if let Err(e) = state.ledger.record_vote(id, direction) {
            error!(id, %direction, "Vote stored but not recorded locally: {e}");
        }

        drop(state);

        info!(id, %direction, upvotes, downvotes, "Vote recorded");
        Ok(())
    }

    pub async fn submit(&self, draft: ReferralDraft) -> Result<Referral, SubmitError> {
        let draft = draft.normalize()?;

        let referral = self.store.create(draft).await.map_err(|e| {
            warn!("Failed to add referral: {e}");
            SubmitError::StoreUnavailable(e)
        })?;

        self.state().referrals.insert(0, referral.clone());

        info!(id = %referral.id, app = %referral.app_name, "Referral added");
        Ok(referral)
    }

    pub fn user_vote_for(&self, id: &str) -> Option<VoteDirection> {
        self.state().ledger.vote_for(id)
    }

    pub fn is_voting(&self, id: &str) -> bool {
        self.state().in_flight.contains(id)
    }

    pub fn referral(&self, id: &str) -> Option<Referral> {
        self.state().referrals.iter().find(|r| r.id == id).cloned()
    }

    pub fn referrals(&self) -> Vec<Referral> {
        self.state().referrals.clone()
    }

    pub fn total_codes(&self) -> usize {
        self.state().referrals.len()
    }

    pub fn apps_in_use(&self) -> Vec<&'static App> {
        catalog::apps_in_use(&self.state().referrals)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn state(&self) -> MutexGuard<'_, BoardState<L>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
