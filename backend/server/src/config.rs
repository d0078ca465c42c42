use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Context, anyhow};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("expected `redis` or `memory`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreKind,
    pub redis_url: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let redis_url: String = try_load("REDIS_URL", "redis://redis:6379")?;

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            store: try_load("REFR_STORE", "redis")?,
            redis_url: with_password(&redis_url, read_secret("REDIS_PASSWORD").as_deref()),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
        .context("Environment misconfigured")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("No {secret_name} secret, connecting without it: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

/// Splices a password into a `redis://host` style url lacking credentials.
fn with_password(url: &str, password: Option<&str>) -> String {
    let Some(password) = password else {
        return url.to_string();
    };

    match url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('@') => format!("{scheme}://:{password}@{rest}"),
        _ => url.to_string(),
    }
}
