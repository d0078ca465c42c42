use std::sync::Arc;

use async_trait::async_trait;
use board::{
    Board, LEDGER_KEY, MemoryStorage, MemoryStore, Referral, ReferralDraft, ReferralStore,
    StoreError, SubmitError, ValidationError, VoteDirection::*, VoteError,
};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

fn referral(id: &str, app_name: &str, upvotes: u32, downvotes: u32) -> Referral {
    Referral {
        id: id.to_string(),
        app_name: app_name.to_string(),
        code: format!("CODE-{id}"),
        referral_link: None,
        description: None,
        upvotes,
        downvotes,
        created_at: DateTime::UNIX_EPOCH,
    }
}

async fn board_with(
    referrals: Vec<Referral>,
) -> (Board<Arc<MemoryStore>, Arc<MemoryStorage>>, Arc<MemoryStore>, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStore::with_referrals(referrals));
    let storage = Arc::new(MemoryStorage::new());

    let board = Board::new(store.clone(), storage.clone());
    board.initialize().await.unwrap();

    (board, store, storage)
}

fn counts(board: &Board<Arc<MemoryStore>, Arc<MemoryStorage>>, id: &str) -> (u32, u32) {
    let referral = board.referral(id).unwrap();
    (referral.upvotes, referral.downvotes)
}

#[tokio::test]
async fn test_vote_updates_counts_store_and_ledger() {
    let (board, store, storage) = board_with(vec![referral("a", "Uber", 4, 1)]).await;

    board.vote("a", Up).await.unwrap();

    assert_eq!(counts(&board, "a"), (5, 1));
    assert_eq!(board.user_vote_for("a"), Some(Up));

    let stored = store.get("a").unwrap();
    assert_eq!((stored.upvotes, stored.downvotes), (5, 1));
    assert_eq!(store.vote_writes(), 1);
    assert_eq!(storage.raw(LEDGER_KEY).as_deref(), Some(r#"{"a":"up"}"#));
}

#[tokio::test]
async fn test_second_vote_is_duplicate() {
    let (board, store, _) = board_with(vec![referral("a", "Uber", 0, 0)]).await;

    board.vote("a", Up).await.unwrap();
    assert_eq!(board.vote("a", Up).await, Err(VoteError::DuplicateVote));
    assert_eq!(board.vote("a", Down).await, Err(VoteError::DuplicateVote));

    assert_eq!(counts(&board, "a"), (1, 0));
    assert_eq!(store.vote_writes(), 1);
}

#[tokio::test]
async fn test_existing_ledger_entry_blocks_vote() {
    let store = Arc::new(MemoryStore::with_referrals(vec![referral("a", "Uber", 2, 0)]));
    let storage = Arc::new(MemoryStorage::with_entry(LEDGER_KEY, r#"{"a":"down"}"#));

    let board = Board::new(store.clone(), storage);
    board.initialize().await.unwrap();

    assert_eq!(board.user_vote_for("a"), Some(Down));
    assert_eq!(board.vote("a", Up).await, Err(VoteError::DuplicateVote));
    assert_eq!(counts(&board, "a"), (2, 0));
    assert_eq!(store.vote_writes(), 0);
}

#[tokio::test]
async fn test_downvote_flags_referral() {
    let (board, _, _) = board_with(vec![referral("a", "Uber", 0, 2)]).await;

    let before = board.get_visible(None, false);
    assert_eq!(before.visible.len(), 1);
    assert_eq!(before.hidden_count, 0);

    board.vote("a", Down).await.unwrap();
    assert_eq!(counts(&board, "a"), (0, 3));

    let after = board.get_visible(None, false);
    assert!(after.visible.is_empty());
    assert_eq!(after.hidden_count, 1);

    let shown = board.get_visible(Some("Uber"), true);
    assert_eq!(shown.visible[0].id, "a");
}

#[tokio::test]
async fn test_unknown_referral() {
    let (board, store, storage) = board_with(vec![referral("a", "Uber", 0, 0)]).await;

    assert_eq!(
        board.vote("gone", Up).await,
        Err(VoteError::NotFound("gone".to_string()))
    );
    assert_eq!(store.vote_writes(), 0);
    assert_eq!(storage.raw(LEDGER_KEY), None);
}

#[tokio::test]
async fn test_full_counter_rejects_vote() {
    let (board, store, storage) = board_with(vec![referral("a", "Uber", u32::MAX, 0)]).await;

    assert_eq!(board.vote("a", Up).await, Err(VoteError::CounterFull));
    assert_eq!(counts(&board, "a"), (u32::MAX, 0));
    assert_eq!(board.user_vote_for("a"), None);
    assert_eq!(store.vote_writes(), 0);
    assert_eq!(storage.raw(LEDGER_KEY), None);
    assert!(!board.is_voting("a"));

    board.vote("a", Down).await.unwrap();
    assert_eq!(counts(&board, "a"), (u32::MAX, 1));
}

#[tokio::test]
async fn test_failed_store_write_changes_nothing() {
    let (board, store, storage) = board_with(vec![referral("a", "Uber", 3, 3)]).await;
    store.fail_writes(true);

    let result = board.vote("a", Down).await;
    assert!(matches!(
        result,
        Err(VoteError::PersistenceFailed(StoreError::Unavailable(_)))
    ));

    assert_eq!(counts(&board, "a"), (3, 3));
    assert_eq!(board.user_vote_for("a"), None);
    assert!(!board.is_voting("a"));
    assert_eq!(storage.raw(LEDGER_KEY), None);

    store.fail_writes(false);
    board.vote("a", Down).await.unwrap();
    assert_eq!(counts(&board, "a"), (3, 4));
}

#[tokio::test]
async fn test_failed_ledger_save_keeps_vote() {
    let (board, store, storage) = board_with(vec![referral("a", "Uber", 0, 0)]).await;
    storage.fail_saves(true);

    board.vote("a", Up).await.unwrap();

    assert_eq!(counts(&board, "a"), (1, 0));
    assert_eq!(store.vote_writes(), 1);
    assert_eq!(board.user_vote_for("a"), Some(Up));
    assert_eq!(storage.raw(LEDGER_KEY), None);
    assert_eq!(board.vote("a", Up).await, Err(VoteError::DuplicateVote));
}

#[tokio::test]
async fn test_ledger_survives_restart() {
    let store = Arc::new(MemoryStore::with_referrals(vec![referral("a", "Uber", 0, 0)]));
    let storage = Arc::new(MemoryStorage::new());

    let first = Board::new(store.clone(), storage.clone());
    first.initialize().await.unwrap();
    first.vote("a", Down).await.unwrap();
    drop(first);

    let second = Board::new(store.clone(), storage.clone());
    second.initialize().await.unwrap();
    assert_eq!(second.user_vote_for("a"), Some(Down));
    assert_eq!(counts(&second, "a"), (0, 1));
    assert_eq!(second.vote("a", Up).await, Err(VoteError::DuplicateVote));
}

#[tokio::test]
async fn test_submit_round_trip() {
    let (board, store, _) = board_with(vec![referral("old", "Uber", 1, 0)]).await;

    let draft = ReferralDraft::new("Venmo", "SAVE5")
        .with_link("https://venmo.com/invite/save5")
        .with_description("$5 each");
    let created = board.submit(draft.clone()).await.unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed[0], created);
    assert_eq!(listed[0].app_name, draft.app_name);
    assert_eq!(listed[0].code, draft.code);
    assert_eq!(listed[0].referral_link, draft.referral_link);
    assert_eq!(listed[0].description, draft.description);
    assert_eq!((listed[0].upvotes, listed[0].downvotes), (0, 0));

    let ids: Vec<_> = board.referrals().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![created.id.clone(), "old".to_string()]);
    assert_eq!(board.total_codes(), 2);

    let names: Vec<_> = board.apps_in_use().iter().map(|app| app.name).collect();
    assert_eq!(names, vec!["Uber", "Venmo"]);
}

#[tokio::test]
async fn test_submit_rejects_before_store() {
    let (board, store, _) = board_with(vec![]).await;

    assert_eq!(
        board.submit(ReferralDraft::new("Uber", "  ")).await,
        Err(SubmitError::ValidationFailed(ValidationError::MissingCode))
    );
    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(board.total_codes(), 0);
}

#[tokio::test]
async fn test_submit_store_failure_keeps_working_set() {
    let (board, store, _) = board_with(vec![referral("a", "Uber", 0, 0)]).await;
    store.fail_writes(true);

    let result = board.submit(ReferralDraft::new("Lyft", "RIDE")).await;
    assert!(matches!(result, Err(SubmitError::StoreUnavailable(_))));
    assert_eq!(board.total_codes(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_list() {
    let (board, store, _) = board_with(vec![referral("a", "Uber", 0, 0)]).await;
    store.fail_reads(true);

    assert!(board.initialize().await.is_err());
    assert_eq!(board.total_codes(), 1);
}

#[tokio::test]
async fn test_newest_first_after_refresh() {
    let now = Utc::now();
    let mut older = referral("older", "Uber", 0, 0);
    older.created_at = now - Duration::hours(1);
    let mut newer = referral("newer", "Uber", 0, 0);
    newer.created_at = now;

    let (board, _, _) = board_with(vec![newer, older]).await;
    let ids: Vec<_> = board
        .get_visible(None, false)
        .visible
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(ids, vec!["newer", "older"]);
}

/// Holds `set_votes` until released, to observe a vote mid-flight.
#[derive(Default)]
struct GatedStore {
    inner: MemoryStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl ReferralStore for GatedStore {
    async fn list(&self) -> Result<Vec<Referral>, StoreError> {
        self.inner.list().await
    }

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError> {
        self.inner.create(draft).await
    }

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.set_votes(id, upvotes, downvotes).await
    }
}

fn gated(referrals: Vec<Referral>) -> GatedStore {
    GatedStore {
        inner: MemoryStore::with_referrals(referrals),
        ..GatedStore::default()
    }
}

#[tokio::test]
async fn test_vote_in_flight_rejected() {
    let board = Board::new(gated(vec![referral("a", "Uber", 0, 0)]), MemoryStorage::new());
    board.initialize().await.unwrap();

    let first = board.vote("a", Up);
    let second = async {
        board.store().entered.notified().await;
        assert!(board.is_voting("a"));

        let result = board.vote("a", Up).await;
        board.store().release.notify_one();
        result
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(VoteError::VoteInFlight));

    assert!(!board.is_voting("a"));
    assert_eq!(board.referral("a").unwrap().upvotes, 1);
    assert_eq!(board.store().inner.vote_writes(), 1);
}

#[tokio::test]
async fn test_dropped_vote_clears_in_flight() {
    let board = Board::new(gated(vec![referral("a", "Uber", 0, 0)]), MemoryStorage::new());
    board.initialize().await.unwrap();

    tokio::select! {
        _ = board.vote("a", Up) => panic!("vote finished without release"),
        _ = board.store().entered.notified() => {}
    }

    assert!(!board.is_voting("a"));
    assert_eq!(board.user_vote_for("a"), None);
    assert_eq!(board.referral("a").unwrap().upvotes, 0);
}
