//! # Referral Board
//!
//! Community board of referral codes for popular apps. Anyone can share a code,
//! anyone can say whether it worked.
//!
//!
//!
//! # Pieces
//!
//! - [`catalog`]: fixed list of known apps with display color and icon
//! - [`referral`]: the stored record, the submit form and vote direction
//! - [`filter`]: which codes are shown, which are hidden behind the banner
//! - [`ledger`]: what this device already voted on, kept in local storage
//! - [`store`]: port to the document collection, plus an in-memory store
//! - [`board`]: working set and the vote/submit operations on top of it
//!
//!
//!
//! # Votes
//!
//! There are no accounts. A device votes at most once per code, which is
//! enforced only by the local ledger. Votes are never taken back, so both
//! counters only ever grow by one at a time.
//!
//! A code with at least 3 votes and 40% or more downvotes is hidden unless the
//! user asks to see hidden codes.
//!
//!
//!
//! # Notes
//!
//! ## Counters
//! The store takes absolute counter values, not increments. Two devices voting on
//! the same code at the same moment can lose one of the votes. This is accepted
//! for now since nothing else depends on exact counts.
pub mod board;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod referral;
pub mod store;

pub use board::Board;
pub use error::{LedgerError, StoreError, SubmitError, ValidationError, VoteError};
pub use filter::{DOWNVOTE_THRESHOLD, MIN_VOTES_FOR_FLAG, Visibility};
pub use ledger::{FileStorage, LEDGER_KEY, LedgerStorage, MemoryStorage, VoteLedger};
pub use referral::{Referral, ReferralDraft, TrustLevel, VoteDirection};
pub use store::{MemoryStore, ReferralStore, VoteCounts};
