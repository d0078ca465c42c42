//! # Vote Ledger
//!
//! Device-local memory of which referrals this user already voted on.
//!
//! ## Storage
//!
//! - One key, [`LEDGER_KEY`], holding the whole ledger as a JSON object
//! - `{ "<referral id>": "up" | "down" }`
//! - Written in full after every new vote, before the vote is acknowledged
//! - Missing or unreadable data means an empty ledger, never an error
//!
//! ## Rules
//!
//! - One entry per referral, written once
//! - Entries are never overwritten or removed
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{error::LedgerError, referral::VoteDirection};

pub const LEDGER_KEY: &str = "refr-votes";

/// Durable string key-value store the ledger persists into.
pub trait LedgerStorage: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> io::Result<()>;
}

impl<T: LedgerStorage + ?Sized> LedgerStorage for Arc<T> {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        (**self).save(key, value)
    }
}

pub struct VoteLedger<S> {
    storage: S,
    votes: BTreeMap<String, VoteDirection>,
}

impl<S: LedgerStorage> VoteLedger<S> {
    pub fn open(storage: S) -> Self {
        let mut ledger = Self {
            storage,
            votes: BTreeMap::new(),
        };
        ledger.votes = ledger.load_all();

        debug!("Loaded {} ledger entries", ledger.votes.len());
        ledger
    }

    /// Reads the persisted ledger, degrading to empty on any failure.
    pub fn load_all(&self) -> BTreeMap<String, VoteDirection> {
        let raw = match self.storage.load(LEDGER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read vote ledger, starting empty: {e}");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Corrupt vote ledger, starting empty: {e}");
            BTreeMap::new()
        })
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.votes.contains_key(id)
    }

    pub fn vote_for(&self, id: &str) -> Option<VoteDirection> {
        self.votes.get(id).copied()
    }

    pub fn entries(&self) -> &BTreeMap<String, VoteDirection> {
        &self.votes
    }

    /// Adds the entry and persists the whole ledger.
    ///
    /// A failed save keeps the entry in memory, so this session still refuses
    /// a second vote, and reports the error since the entry is not durable.
    pub fn record_vote(&mut self, id: &str, direction: VoteDirection) -> Result<(), LedgerError> {
        if self.has_voted(id) {
            return Err(LedgerError::AlreadyVoted(id.to_string()));
        }

        self.votes.insert(id.to_string(), direction);

        let encoded = serde_json::to_string(&self.votes)?;
        self.storage.save(LEDGER_KEY, &encoded)?;

        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// In-process storage with a switch to make saves fail.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_saves: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        storage
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl LedgerStorage for MemoryStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::other("storage full"));
        }

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LedgerStorage for FileStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        write_synced(&staging, value)?;

        fs::rename(staging, path)
    }
}

fn write_synced(path: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}
