//! Cookie-based server-side sessions.
//!
//! A [`SessionInterface`] runs twice per request: [`SessionInterface::open`]
//! before the handler restores the client's session from a pluggable
//! [`SessionStore`], and [`SessionInterface::save`] after the handler writes
//! it back (or deletes it) and emits the matching `Set-Cookie` header.
//! Unchanged sessions cost one store read and nothing else.
//!
//! # Main types
//!
//! - [`Session`] — Shared handle over one request's key/value session state.
//! - [`SessionConfig`] — Cookie name, domain, prefix, expiry and cookie mode.
//! - [`SessionCookie`] — Outgoing cookie attributes (normal and delete forms).
//! - [`SessionStore`] — Three-method storage contract implemented by backends.
//! - [`MemoryStore`], [`FileStore`] — Bundled backends (`RedisStore` behind
//!   the `redis` feature).
//! - [`BackendConfig`] — Enumerated backend selection, see [`build_store`].

/// Enumerated backend selection and the store factory.
pub mod backend;
/// Session and installation configuration.
pub mod config;
/// Cookie attribute computation and `Cookie` header parsing.
pub mod cookie;
/// File-backed session store.
pub mod file_store;
/// The session lifecycle orchestrator.
pub mod interface;
/// Redis-backed session store.
#[cfg(feature = "redis")]
pub mod redis;
/// The per-request session handle.
pub mod session;
/// Storage contract and the in-process backend.
pub mod store;

pub use backend::{build_store, BackendConfig};
pub use config::{KeepsakeConfig, SessionConfig};
pub use cookie::SessionCookie;
pub use file_store::FileStore;
pub use interface::SessionInterface;
#[cfg(feature = "redis")]
pub use redis::RedisStore;
pub use session::Session;
pub use store::{MemoryStore, SessionStore};
