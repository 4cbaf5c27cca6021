use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use keepsake_session::{Session, SessionInterface};
use std::ops::Deref;
use std::sync::Arc;
use tracing::error;

/// Session middleware: opens the session before the handler runs and saves
/// it afterwards.
///
/// A failing store turns the request into `500 Internal Server Error`; the
/// handler never runs if the session could not be opened.
pub async fn session_middleware(
    State(sessions): State<Arc<SessionInterface>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match sessions.open(&mut request).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to open session");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable").into_response();
        }
    };

    let mut response = next.run(request).await;

    if let Err(e) = sessions.save(&session, &mut response).await {
        error!(sid = %session.sid(), error = %e, "Failed to save session");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable").into_response();
    }
    response
}

/// Extractor for the current request's session.
///
/// Rejects with `500` when [`session_middleware`] is not installed on the
/// route.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl Deref for CurrentSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session middleware is not installed",
            ))
    }
}
