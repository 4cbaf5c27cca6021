use crate::middleware::session_middleware;
use axum::{middleware as axum_mw, Router};
use keepsake_core::KeepsakeResult;
use keepsake_session::{KeepsakeConfig, SessionInterface};
use std::sync::Arc;
use tracing::info;

/// Installs Keepsake sessions on an axum [`Router`].
pub trait SessionRouterExt {
    /// Wraps every route in [`session_middleware`] backed by `sessions`.
    fn with_sessions(self, sessions: Arc<SessionInterface>) -> Self;
}

impl<S> SessionRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_sessions(self, sessions: Arc<SessionInterface>) -> Self {
        self.layer(axum_mw::from_fn_with_state(sessions, session_middleware))
    }
}

/// Builds the configured store and installs sessions on `router`.
///
/// Configuration problems (invalid cookie name, uncompiled backend) fail
/// here, before the router serves anything.
pub async fn install<S>(router: Router<S>, config: KeepsakeConfig) -> KeepsakeResult<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let backend = config.backend.name();
    let sessions = Arc::new(SessionInterface::from_config(config).await?);
    info!(
        backend,
        cookie = %sessions.config().cookie_name,
        "Session middleware installed"
    );
    Ok(router.with_sessions(sessions))
}
