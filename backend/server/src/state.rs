use std::sync::Arc;

use board::{MemoryStore, ReferralStore};
use tracing::warn;

use super::{
    config::{Config, StoreKind},
    database::{RedisStore, init_redis},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReferralStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Arc<Self>> {
        let config = Config::load()?;

        let store: Arc<dyn ReferralStore> = match config.store {
            StoreKind::Redis => Arc::new(RedisStore::new(init_redis(&config.redis_url).await?)),
            StoreKind::Memory => {
                warn!("Using in-memory store, referrals are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ReferralStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
