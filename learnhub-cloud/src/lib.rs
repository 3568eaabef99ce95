//! Hosted backend adapter for LearnHub.
//!
//! Speaks the hosted service's two surfaces:
//! - the auth endpoints (email/password sign-up and sign-in, session
//!   retrieval, sign-out)
//! - the table REST endpoints (insert/select/update/delete/upsert with
//!   column filters; a unique violation comes back as HTTP 409)
//!
//! The [`SessionContext`] holds the authenticated identity and notifies
//! subscribers of auth-state changes; owner-scoped operations re-read it
//! on every call instead of trusting a cached copy.

pub mod client;
pub mod config;
pub mod error;
pub mod rows;
pub mod session;

pub use client::RemoteClient;
pub use config::RemoteConfig;
pub use error::{RemoteError, RemoteResult};
pub use session::{Session, SessionContext};
