use async_trait::async_trait;
use keepsake_core::KeepsakeResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

/// Storage contract for session records.
///
/// Keys arrive already prefixed (`prefix + SID`). A missing record is
/// `Ok(None)`, never an error; any other failure propagates to the request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches the record stored under `key`.
    async fn get(&self, key: &str) -> KeepsakeResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, expiring after `ttl_seconds`.
    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> KeepsakeResult<()>;

    /// Removes the record. Deleting a missing record is not an error.
    async fn delete(&self, key: &str) -> KeepsakeResult<()>;
}

struct Entry {
    value: Vec<u8>,
    /// `None` when the TTL overflows the clock.
    deadline: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// How often `set` sweeps expired records out of a [`MemoryStore`].
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process session store. Records vanish with the process.
///
/// Expired records read as absent. They are evicted on access, by a sweep
/// that `set` runs at most once per [`SWEEP_INTERVAL`], or by
/// [`MemoryStore::purge_expired`].
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    next_sweep: Mutex<Instant>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_sweep: Mutex::new(Instant::now() + SWEEP_INTERVAL),
        }
    }

    /// Claims the next sweep if one is due at `now`.
    fn sweep_due(&self, now: Instant) -> bool {
        let mut next = self.next_sweep.lock();
        if now < *next {
            return false;
        }
        *next = now + SWEEP_INTERVAL;
        true
    }

    /// Number of live (unexpired) records.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Returns true if no live records remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired record, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> KeepsakeResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer replaced it in the meantime.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> KeepsakeResult<()> {
        let now = Instant::now();
        let deadline = now.checked_add(Duration::from_secs(ttl_seconds));
        let mut entries = self.entries.write().await;
        if self.sweep_due(now) {
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            trace!(evicted = before - entries.len(), "Swept expired session records");
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                deadline,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> KeepsakeResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
