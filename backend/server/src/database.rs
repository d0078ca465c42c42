//! # Redis
//!
//! Document store for every shared referral.
//!
//! ## Layout
//!
//! - `referral:<id>`: hash, one field per document field
//! - `referrals`: sorted set of ids scored by creation time in milliseconds
//! - Listing reads the sorted set newest first, then every hash in one pipeline
//! - Creating writes the hash and the sorted set entry in one `MULTI`
//! - Vote counters are set by a script that checks the hash exists first, so a
//!   deleted referral is never recreated as a partial hash
//!
//! ## Notes
//! Vote counters are plain `HSET` overwrites, not `HINCRBY`. Concurrent voters
//! on the same referral can overwrite each other.
use std::{collections::HashMap, num::ParseIntError, sync::LazyLock};

use async_trait::async_trait;
use board::{Referral, ReferralDraft, ReferralStore, StoreError};
use chrono::{DateTime, Utc};
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const REFERRALS_KEY: &str = "referrals";
const REFERRAL_PREFIX: &str = "referral:";

const APP_NAME: &str = "appName";
const CODE: &str = "code";
const REFERRAL_LINK: &str = "referralLink";
const DESCRIPTION: &str = "description";
const UPVOTES: &str = "upvotes";
const DOWNVOTES: &str = "downvotes";
const CREATED_AT: &str = "createdAt";

// KEYS[1] referral hash, ARGV field/value pairs. Returns 0 if the hash is gone.
static SET_VOTES: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV))
        return 1
        ",
    )
});

pub async fn init_redis(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let config = ConnectionManagerConfig::new().set_number_of_retries(1);

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");
    Ok(connection_manager)
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ReferralStore for RedisStore {
    async fn list(&self) -> Result<Vec<Referral>, StoreError> {
        let mut connection = self.connection.clone();

        let ids: Vec<String> = connection
            .zrevrange(REFERRALS_KEY, 0, -1)
            .await
            .map_err(unavailable)?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(referral_key(id));
        }

        let documents: Vec<HashMap<String, String>> =
            pipe.query_async(&mut connection).await.map_err(unavailable)?;

        Ok(ids
            .into_iter()
            .zip(documents)
            .filter_map(|(id, fields)| {
                from_fields(&id, fields)
                    .map_err(|e| warn!(id, "Skipping unreadable referral: {e}"))
                    .ok()
            })
            .collect())
    }

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError> {
        let mut connection = self.connection.clone();
        let referral = Referral::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());

        redis::pipe()
            .atomic()
            .hset_multiple(referral_key(&referral.id), &to_fields(&referral))
            .ignore()
            .zadd(
                REFERRALS_KEY,
                &referral.id,
                referral.created_at.timestamp_millis(),
            )
            .ignore()
            .query_async::<()>(&mut connection)
            .await
            .map_err(unavailable)?;

        Ok(referral)
    }

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let updated: bool = SET_VOTES
            .key(referral_key(id))
            .arg(UPVOTES)
            .arg(upvotes)
            .arg(DOWNVOTES)
            .arg(downvotes)
            .invoke_async(&mut connection)
            .await
            .map_err(unavailable)?;

        match updated {
            true => Ok(()),
            false => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn referral_key(id: &str) -> String {
    format!("{REFERRAL_PREFIX}{id}")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("Document is missing")]
    Missing,

    #[error("Field {0} is missing")]
    MissingField(&'static str),

    #[error("Field {0} is malformed: {1}")]
    Malformed(&'static str, String),
}

fn to_fields(referral: &Referral) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        (APP_NAME, referral.app_name.clone()),
        (CODE, referral.code.clone()),
        (UPVOTES, referral.upvotes.to_string()),
        (DOWNVOTES, referral.downvotes.to_string()),
        (CREATED_AT, referral.created_at.to_rfc3339()),
    ];

    if let Some(link) = &referral.referral_link {
        fields.push((REFERRAL_LINK, link.clone()));
    }

    if let Some(description) = &referral.description {
        fields.push((DESCRIPTION, description.clone()));
    }

    fields
}

fn from_fields(id: &str, mut fields: HashMap<String, String>) -> Result<Referral, FieldError> {
    if fields.is_empty() {
        return Err(FieldError::Missing);
    }

    let mut take = |name: &'static str| fields.remove(name).ok_or(FieldError::MissingField(name));

    let app_name = take(APP_NAME)?;
    let code = take(CODE)?;
    let created_at = take(CREATED_AT)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| FieldError::Malformed(CREATED_AT, e.to_string()))?
        .with_timezone(&Utc);

    let upvotes = count(take(UPVOTES).ok(), UPVOTES)?;
    let downvotes = count(take(DOWNVOTES).ok(), DOWNVOTES)?;

    Ok(Referral {
        id: id.to_string(),
        app_name,
        code,
        referral_link: take(REFERRAL_LINK).ok(),
        description: take(DESCRIPTION).ok(),
        upvotes,
        downvotes,
        created_at,
    })
}

fn count(value: Option<String>, name: &'static str) -> Result<u32, FieldError> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|e: ParseIntError| FieldError::Malformed(name, e.to_string())),
        None => Ok(0),
    }
}
