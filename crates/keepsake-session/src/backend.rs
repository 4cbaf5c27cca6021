use crate::file_store::FileStore;
use crate::store::{MemoryStore, SessionStore};
use keepsake_core::KeepsakeResult;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Which storage backend to build.
///
/// Deserializes from a `kind`-tagged table; an unknown `kind` is a parse
/// error, never a silent fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process map; records are lost on restart.
    #[default]
    Memory,
    /// One file per record under `dir`.
    File {
        /// Directory holding the record files (created if missing).
        dir: PathBuf,
    },
    /// Redis server; requires the `redis` feature.
    Redis {
        /// Connection URL, e.g. `redis://localhost:6379`.
        url: String,
    },
}

impl BackendConfig {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Redis { .. } => "redis",
        }
    }
}

/// Builds the store described by `config`.
///
/// Fails with a config error for a backend whose cargo feature is not
/// compiled in, so misconfiguration surfaces before any request is served.
pub async fn build_store(config: &BackendConfig) -> KeepsakeResult<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config {
        BackendConfig::Memory => Arc::new(MemoryStore::new()),
        BackendConfig::File { dir } => Arc::new(FileStore::new(dir.clone()).await?),
        BackendConfig::Redis { url } => redis_store(url)?,
    };
    info!(backend = config.name(), "Session store ready");
    Ok(store)
}

#[cfg(feature = "redis")]
fn redis_store(url: &str) -> KeepsakeResult<Arc<dyn SessionStore>> {
    Ok(Arc::new(crate::redis::RedisStore::from_url(url)?))
}

#[cfg(not(feature = "redis"))]
fn redis_store(_url: &str) -> KeepsakeResult<Arc<dyn SessionStore>> {
    Err(keepsake_core::KeepsakeError::Config(
        "the redis backend requires keepsake-session to be built with the `redis` feature".into(),
    ))
}
