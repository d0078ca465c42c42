use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Referral {0} not found")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Already voted on {0}")]
    AlreadyVoted(String),

    #[error("Failed to persist vote ledger: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to encode vote ledger: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Pick an app for this code")]
    MissingAppName,

    #[error("Referral code cannot be empty")]
    MissingCode,

    #[error("Referral link must be an http(s) URL: {0}")]
    InvalidLink(String),

    #[error("Note is {0} characters, the limit is 200")]
    DescriptionTooLong(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("You already voted on this referral!")]
    DuplicateVote,

    #[error("A vote on this referral is still in progress")]
    VoteInFlight,

    #[error("Referral {0} is gone, refresh the list")]
    NotFound(String),

    #[error("This referral cannot take any more votes")]
    CounterFull,

    #[error("Failed to record vote. Try again. ({0})")]
    PersistenceFailed(StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    #[error("Failed to add referral. Try again. ({0})")]
    StoreUnavailable(StoreError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Vote must be `up` or `down`, got `{0}`")]
pub struct ParseDirectionError(pub String);
