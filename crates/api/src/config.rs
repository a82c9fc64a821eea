//! Startup configuration from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use pantry_observability::LogFormat;
use pantry_store::{FirestoreConfig, INVENTORY_COLLECTION};

/// Which document store backs the inventory.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Process-local; contents are lost on restart.
    Memory,
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub store: StoreBackend,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("PANTRY_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("PANTRY_BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        let log_format = match var("PANTRY_LOG_FORMAT") {
            Some(raw) => LogFormat::from_str(&raw).context("invalid PANTRY_LOG_FORMAT")?,
            None => LogFormat::default(),
        };

        let store = match var("PANTRY_STORE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("firestore") => StoreBackend::Firestore(firestore_config(&var)?),
            Some(other) => bail!("PANTRY_STORE must be 'memory' or 'firestore', got '{other}'"),
        };

        Ok(Self {
            bind_addr,
            log_format,
            store,
        })
    }
}

fn firestore_config(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<FirestoreConfig> {
    let project_id = var("FIRESTORE_PROJECT_ID")
        .context("FIRESTORE_PROJECT_ID is required when PANTRY_STORE=firestore")?;
    let collection = var("FIRESTORE_COLLECTION").unwrap_or_else(|| INVENTORY_COLLECTION.to_string());

    let mut cfg = FirestoreConfig::new(project_id, collection);
    if let Some(database) = var("FIRESTORE_DATABASE") {
        cfg = cfg.with_database(database);
    }
    if let Some(host) = var("FIRESTORE_EMULATOR_HOST") {
        cfg = cfg.with_emulator(&host);
    }
    if let Some(key) = var("FIRESTORE_API_KEY") {
        cfg = cfg.with_api_key(key);
    }
    if let Some(token) = var("FIRESTORE_BEARER_TOKEN") {
        cfg = cfg.with_bearer_token(token);
    }
    if let Some(secs) = var("FIRESTORE_TIMEOUT_SECS") {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("FIRESTORE_TIMEOUT_SECS must be whole seconds, got '{secs}'"))?;
        cfg = cfg.with_timeout(Duration::from_secs(secs));
    }
    Ok(cfg)
}
