use crate::backend::build_store;
use crate::config::{KeepsakeConfig, SessionConfig};
use crate::cookie::{read_cookie, SessionCookie};
use crate::session::{generate_sid, Session};
use crate::store::SessionStore;
use chrono::Utc;
use http::header::{HeaderMap, SET_COOKIE};
use http::{Request, Response};
use keepsake_core::KeepsakeResult;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Session lifecycle orchestrator.
///
/// [`open`](Self::open) runs before the handler and [`save`](Self::save)
/// after it. Concurrent requests carrying the same SID are not coordinated:
/// the last completed write wins.
pub struct SessionInterface {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionInterface {
    /// Validates `config` and binds it to `store`.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> KeepsakeResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Builds the configured backend and the interface on top of it.
    pub async fn from_config(config: KeepsakeConfig) -> KeepsakeResult<Self> {
        let store = build_store(&config.backend).await?;
        Self::new(store, config.session)
    }

    /// The validated cookie and record settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Store key for a SID.
    pub fn record_key(&self, sid: &str) -> String {
        format!("{}{}", self.config.prefix, sid)
    }

    /// Restores the request's session and attaches it to the request
    /// extensions.
    ///
    /// Only a failing store is an error; a missing or undecodable record
    /// yields an empty session under the presented SID.
    pub async fn open<B>(&self, request: &mut Request<B>) -> KeepsakeResult<Session> {
        let session = self.load(request.headers()).await?;
        request.extensions_mut().insert(session.clone());
        Ok(session)
    }

    /// Restores the session named by the `Cookie` headers.
    pub async fn load(&self, headers: &HeaderMap) -> KeepsakeResult<Session> {
        let Some(sid) = read_cookie(headers, &self.config.cookie_name) else {
            let sid = generate_sid();
            debug!(sid = %sid, "No session cookie, starting a new session");
            return Ok(Session::fresh(sid));
        };

        let data = match self.store.get(&self.record_key(&sid)).await? {
            None => {
                debug!(sid = %sid, "No stored record for session cookie");
                Map::new()
            }
            Some(raw) => match serde_json::from_slice::<Map<String, Value>>(&raw) {
                Ok(data) => data,
                Err(e) => {
                    warn!(sid = %sid, error = %e, "Discarding undecodable session record");
                    Map::new()
                }
            },
        };
        Ok(Session::restored(sid, data))
    }

    /// Persists the session opened for this request and adds the matching
    /// `Set-Cookie` header to `response`.
    pub async fn save<B>(&self, session: &Session, response: &mut Response<B>) -> KeepsakeResult<()> {
        self.persist(session, response.headers_mut()).await
    }

    /// Persists `session`, appending any cookie to `headers`.
    ///
    /// - empty: delete the record and, if the handler emptied it, expire the cookie;
    /// - unchanged and not new: nothing;
    /// - otherwise: write the record with the configured TTL and issue the cookie.
    pub async fn persist(&self, session: &Session, headers: &mut HeaderMap) -> KeepsakeResult<()> {
        let pending = session.pending();
        let sid = session.sid();
        let key = self.record_key(sid);

        if pending.data.is_empty() {
            if pending.cleared && !pending.touched {
                trace!(sid = %sid, "Session already deleted");
                return Ok(());
            }
            self.store.delete(&key).await?;
            // An untouched empty session leaves the response cookies alone.
            let expire = pending.touched;
            if expire {
                let cookie = SessionCookie::expire(sid, &self.config);
                headers.append(SET_COOKIE, cookie.to_header_value()?);
            }
            session.mark_cleared();
            debug!(sid = %sid, expired_cookie = expire, "Deleted empty session");
            return Ok(());
        }

        if !pending.is_new && !pending.modified {
            trace!(sid = %sid, "Session unchanged, skipping write");
            return Ok(());
        }

        let payload = serde_json::to_vec(&pending.data)?;
        self.store.set(&key, &payload, self.config.expiry).await?;
        let cookie = SessionCookie::issue(sid, &self.config, Utc::now());
        headers.append(SET_COOKIE, cookie.to_header_value()?);
        session.mark_written(pending.data);
        debug!(sid = %sid, bytes = payload.len(), "Saved session");
        Ok(())
    }
}
