//! Local persistence for LearnHub.
//!
//! Mirrors the browser-storage model the application grew up with: every
//! record is a JSON string under a namespaced key. The [`KeyValueStore`]
//! port keeps the entity logic testable without a real database.
//! Production uses the embedded SQLite backend, tests usually use
//! [`MemoryKv`].

mod error;
mod kv;
mod local;

pub mod keys;

pub use error::{StoreError, StoreResult};
pub use kv::{KeyValueStore, MemoryKv, SqliteKv};
pub use local::{LocalStore, RawLocalSettings};
