use crate::store::SessionStore;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use keepsake_core::{KeepsakeError, KeepsakeResult};

/// Redis-backed session store. Expiry is enforced server-side with `SETEX`.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Wraps an existing connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `url` (e.g. `redis://localhost:6379`). Connections
    /// are opened lazily, so an unreachable server surfaces on first use.
    pub fn from_url(url: &str) -> KeepsakeResult<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| KeepsakeError::Config(format!("Redis pool creation failed: {e}")))?;
        Ok(Self::new(pool))
    }

    async fn conn(&self) -> KeepsakeResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| KeepsakeError::Backend(format!("Redis pool: {e}")))
    }
}

fn backend_err(e: deadpool_redis::redis::RedisError) -> KeepsakeError {
    KeepsakeError::Backend(format!("Redis: {e}"))
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, key: &str) -> KeepsakeResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(backend_err)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> KeepsakeResult<()> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(backend_err)
    }

    async fn delete(&self, key: &str) -> KeepsakeResult<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await.map_err(backend_err)
    }
}
