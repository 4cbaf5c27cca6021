use crate::store::SessionStore;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use keepsake_core::{KeepsakeError, KeepsakeResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// On-disk form of one record.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    expires_at: Option<DateTime<Utc>>,
    /// Base64 of the stored bytes.
    data: String,
}

impl Envelope {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// File-based session store: one JSON envelope per record.
///
/// File names are the hex SHA-256 of the key, so any prefix (including `:`)
/// and any client-supplied SID map to a fixed-length, portable name.
/// Records are replaced by writing a temporary file and renaming it over the
/// old one, so readers see either the previous or the new envelope.
/// Expired envelopes read as absent and are removed.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn new(dir: PathBuf) -> KeepsakeResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", hex::encode(Sha256::digest(key.as_bytes()))))
    }

    async fn remove(path: &Path) -> KeepsakeResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every expired envelope, returning how many were removed.
    pub async fn purge_expired(&self) -> KeepsakeResult<usize> {
        let now = Utc::now();
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            let Ok(envelope) = serde_json::from_str::<Envelope>(&raw) else {
                continue;
            };
            if envelope.is_expired(now) {
                Self::remove(&path).await?;
                removed += 1;
            }
        }
        debug!(dir = %self.dir.display(), removed, "Purged expired session files");
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> KeepsakeResult<Option<Vec<u8>>> {
        let path = self.record_path(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = serde_json::from_str(&raw)
            .map_err(|e| KeepsakeError::Backend(format!("Failed to parse session file: {e}")))?;

        if envelope.is_expired(Utc::now()) {
            Self::remove(&path).await?;
            return Ok(None);
        }

        let data = STANDARD
            .decode(envelope.data)
            .map_err(|e| KeepsakeError::Backend(format!("Failed to decode session file: {e}")))?;
        Ok(Some(data))
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> KeepsakeResult<()> {
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        let envelope = Envelope {
            expires_at,
            data: STANDARD.encode(value),
        };
        let json = serde_json::to_string(&envelope)?;
        let path = self.record_path(key);
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> KeepsakeResult<()> {
        Self::remove(&self.record_path(key)).await
    }
}
