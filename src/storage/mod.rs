//! Local Storage Module
//!
//! The offline core persists everything through a process-wide, string-keyed
//! JSON blob store. The store is durable across process restarts but not
//! across an uninstall/reinstall.
//!
//! ## Key Components
//!
//! - `KeyValueStore`: the storage port every service is written against
//! - `SqliteStore`: durable SQLite-backed implementation (the default)
//! - `MemoryStore`: in-memory implementation for tests and for running in a
//!   fully-degraded "no offline support" mode when the durable store cannot
//!   be opened
//!
//! ## Concurrency
//!
//! Multiple logical callers (screens, background sync) share one store
//! without explicit mutual exclusion. Every write is a full-blob replace
//! keyed by a stable scope id, so concurrent writers to different keys never
//! conflict and concurrent writers to the same key resolve last-write-wins.

use async_trait::async_trait;

use crate::shared::error::Result;

/// Durable SQLite-backed store
pub mod sqlite;

/// In-memory store for tests and degraded mode
pub mod memory;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// String-keyed JSON blob store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any existing blob
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the blob stored under `key`; removing a missing key is not an
    /// error
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys beginning with `prefix`, in unspecified order
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
