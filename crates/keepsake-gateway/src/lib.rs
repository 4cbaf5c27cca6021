//! axum integration for Keepsake sessions.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use keepsake_gateway::{install, CurrentSession};
//! use keepsake_session::KeepsakeConfig;
//!
//! async fn visits(session: CurrentSession) -> String {
//!     let n = session.get::<u64>("visits").unwrap_or(0) + 1;
//!     let _ = session.insert("visits", n);
//!     n.to_string()
//! }
//!
//! # async fn run() -> keepsake_core::KeepsakeResult<()> {
//! let app = install(Router::<()>::new().route("/", get(visits)), KeepsakeConfig::default()).await?;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

/// Session middleware and the `CurrentSession` extractor.
pub mod middleware;
/// Router installation helpers.
pub mod server;

pub use middleware::{session_middleware, CurrentSession};
pub use server::{install, SessionRouterExt};
