use keepsake_core::KeepsakeResult;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Generates a fresh session identifier: 128 random bits as 32 hex chars.
pub fn generate_sid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug)]
struct SessionState {
    data: Map<String, Value>,
    /// Content as last loaded from or written to the store.
    snapshot: Map<String, Value>,
    is_new: bool,
    /// A mutating call ran since the last write or delete, even if the
    /// content ended up equal to the snapshot.
    touched: bool,
    /// The record was deleted and nothing has been written since.
    cleared: bool,
}

/// What `save` needs to know about a session, captured under one lock.
#[derive(Debug)]
pub(crate) struct PendingSave {
    pub data: Map<String, Value>,
    pub is_new: bool,
    pub modified: bool,
    pub touched: bool,
    pub cleared: bool,
}

/// Handle to one client's session for the duration of a request.
///
/// Cloning is cheap and every clone sees the same state, so the copy stored
/// in the request extensions and the copy kept by the middleware for `save`
/// stay in sync.
#[derive(Debug, Clone)]
pub struct Session {
    sid: Arc<str>,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// A brand-new, empty session with no backing record.
    pub(crate) fn fresh(sid: String) -> Self {
        Self::build(sid, Map::new(), true)
    }

    /// A session restored for a SID the client presented.
    pub(crate) fn restored(sid: String, data: Map<String, Value>) -> Self {
        Self::build(sid, data, false)
    }

    fn build(sid: String, data: Map<String, Value>, is_new: bool) -> Self {
        Self {
            sid: sid.into(),
            state: Arc::new(Mutex::new(SessionState {
                snapshot: data.clone(),
                data,
                is_new,
                touched: false,
                cleared: false,
            })),
        }
    }

    /// The session identifier carried in the cookie.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// True until the session has been written to the store once.
    pub fn is_new(&self) -> bool {
        self.state.lock().is_new
    }

    /// True if the content differs from what was loaded (or last saved).
    pub fn is_modified(&self) -> bool {
        let state = self.state.lock();
        state.data != state.snapshot
    }

    /// Reads and deserializes a value. Returns `None` if the key is missing
    /// or holds a value of a different shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        serde_json::from_value(value).ok()
    }

    /// Reads the raw JSON value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.state.lock().data.get(key).cloned()
    }

    /// Serializes and stores a value, returning the previous one.
    pub fn insert<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: T,
    ) -> KeepsakeResult<Option<Value>> {
        let value = serde_json::to_value(value)?;
        Ok(self.insert_value(key, value))
    }

    /// Stores a raw JSON value, returning the previous one.
    pub fn insert_value(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        let mut state = self.state.lock();
        state.touched = true;
        state.data.insert(key.into(), value)
    }

    /// Removes a key, returning its value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock();
        state.touched = true;
        state.data.remove(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    /// Number of keys in the session.
    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    /// An empty session is deleted from the store on save.
    pub fn is_empty(&self) -> bool {
        self.state.lock().data.is_empty()
    }

    /// Removes every key. The next save deletes the record and expires the
    /// client cookie.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.touched = true;
        state.data.clear();
    }

    /// The session keys, in map order.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().data.keys().cloned().collect()
    }

    /// A copy of the current content.
    pub fn to_map(&self) -> Map<String, Value> {
        self.state.lock().data.clone()
    }

    pub(crate) fn pending(&self) -> PendingSave {
        let state = self.state.lock();
        PendingSave {
            data: state.data.clone(),
            is_new: state.is_new,
            modified: state.data != state.snapshot,
            touched: state.touched,
            cleared: state.cleared,
        }
    }

    /// Records a completed write of `written`.
    pub(crate) fn mark_written(&self, written: Map<String, Value>) {
        let mut state = self.state.lock();
        state.snapshot = written;
        state.is_new = false;
        state.touched = false;
        state.cleared = false;
    }

    /// Records a completed delete.
    pub(crate) fn mark_cleared(&self) {
        let mut state = self.state.lock();
        state.snapshot = Map::new();
        state.is_new = false;
        state.touched = false;
        state.cleared = true;
    }
}
