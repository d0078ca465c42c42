//! # Referral Store
//!
//! Port to the document collection holding every referral.
//!
//! ## Contract
//!
//! - `list`: whole collection, newest first
//! - `create`: store assigns the id and creation time, counts start at zero
//! - `set_votes`: overwrites both counters, last write wins
//!
//! ## Notes
//! Overwriting is not safe when two devices vote on the same referral at the
//! same time: both read `n` and both write `n + 1`. Counters are kept as plain
//! overwrites anyway since votes only ever come from a single local flag.
use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::StoreError,
    referral::{Referral, ReferralDraft},
};

/// Body of a counter overwrite.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCounts {
    pub upvotes: u32,
    pub downvotes: u32,
}

#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Referral>, StoreError>;

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError>;

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ReferralStore + ?Sized> ReferralStore for std::sync::Arc<T> {
    async fn list(&self) -> Result<Vec<Referral>, StoreError> {
        (**self).list().await
    }

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError> {
        (**self).create(draft).await
    }

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError> {
        (**self).set_votes(id, upvotes, downvotes).await
    }
}

/// Process-local store. Backs the server when Redis is not wanted and every
/// test that needs a store, hence the failure switches and write counter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    referrals: Mutex<Vec<Referral>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    vote_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the collection; `referrals` must already be newest first.
    pub fn with_referrals(referrals: Vec<Referral>) -> Self {
        Self {
            referrals: Mutex::new(referrals),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set_votes` calls.
    pub fn vote_writes(&self) -> usize {
        self.vote_writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Referral> {
        self.referrals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn check(&self, switch: &AtomicBool) -> Result<(), StoreError> {
        if switch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl ReferralStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Referral>, StoreError> {
        self.check(&self.fail_reads)?;

        Ok(self
            .referrals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError> {
        self.check(&self.fail_writes)?;

        let referral = Referral::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());
        self.referrals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, referral.clone());

        Ok(referral)
    }

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;

        let mut referrals = self.referrals.lock().unwrap_or_else(PoisonError::into_inner);
        let referral = referrals
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        referral.upvotes = upvotes;
        referral.downvotes = downvotes;
        self.vote_writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
