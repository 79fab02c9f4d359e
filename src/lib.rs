//! Lectern - Offline Core
//!
//! Lectern is the offline cache and draft-sync core of a learning-platform
//! client (courses, discussions, announcements, resources). It lets a user
//! read previously-seen content while disconnected, queue new posts as
//! local drafts, and reconcile both against the hosted backend once
//! connectivity returns.
//!
//! # Overview
//!
//! - **`storage`** - process-wide string-keyed JSON blob store
//!   (SQLite-backed by default, in-memory for tests and degraded mode)
//! - **`sync`** - network status monitor (one-shot reconnect edge, fan-out
//!   snapshots) and the reconnect coordinator
//! - **`cache`** - write-through cache of remote content with staleness
//!   tracking, schema-versioned wipe-and-rebuild migration, and per-course
//!   eviction
//! - **`drafts`** - durable queue of unsent posts with oldest-first
//!   sequential flush, per-item failure isolation, and exponential retry
//!   backoff
//! - **`remote`** - the injected abstraction over the hosted document
//!   backend
//! - **`shared`** - content types, configuration, errors, and the clock
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lectern::cache::CacheService;
//! use lectern::drafts::DraftManager;
//! use lectern::shared::{OfflineConfig, SystemClock};
//! use lectern::storage::SqliteStore;
//! use lectern::sync::{NetworkMonitor, SyncCoordinator};
//!
//! # async fn example(backend: Arc<dyn lectern::remote::RemoteBackend>) -> lectern::shared::Result<()> {
//! let store = Arc::new(SqliteStore::open_default().await?);
//! let config = OfflineConfig::default();
//! let clock = Arc::new(SystemClock);
//!
//! let cache = Arc::new(CacheService::new(
//!     store.clone(),
//!     backend.clone(),
//!     config.clone(),
//!     clock.clone(),
//! ));
//! cache.initialize().await?;
//!
//! let drafts = Arc::new(DraftManager::new(store, backend, &config, clock));
//! let monitor = Arc::new(NetworkMonitor::new());
//! let coordinator = Arc::new(SyncCoordinator::new(drafts, cache, &monitor));
//!
//! // Drive the monitor from the platform connectivity API and let the
//! // coordinator react to reconnects.
//! let worker = coordinator.clone();
//! tokio::spawn(async move { worker.run().await });
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Semantics
//!
//! Read paths never raise: missing or corrupted cached data is served as
//! empty and logged. Write and initialization paths return
//! [`shared::error::OfflineError`]; only a store that cannot be opened at
//! all propagates, so the application can fall back to running without
//! offline support.

/// Write-through content cache
pub mod cache;

/// Durable draft queue
pub mod drafts;

/// Injected remote backend abstraction
pub mod remote;

/// Shared types, configuration, errors, clock
pub mod shared;

/// Local key-value storage
pub mod storage;

/// Network monitoring and the reconnect coordinator
pub mod sync;

pub use cache::{CacheMetadata, CacheService, CacheSizeReport};
pub use drafts::{DraftManager, SyncReport};
pub use remote::RemoteBackend;
pub use shared::{OfflineConfig, OfflineError};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use sync::{NetworkMonitor, NetworkState, SyncCoordinator};
