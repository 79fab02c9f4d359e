//! Shared Module
//!
//! Types and plumbing used by every layer of the offline core: domain
//! content shapes, the crate error type, configuration, and the injectable
//! clock.

/// Domain content types and the cache wrapper
pub mod content;

/// Shared error types
pub mod error;

/// Offline core configuration
pub mod config;

/// Clock abstraction for testable time
pub mod time;

/// Re-export commonly used types for convenience
pub use config::{OfflineConfig, OfflineConfigBuilder, CACHE_SCHEMA_VERSION};
pub use content::{Announcement, Cached, Comment, CourseResource, DraftPost, NewDraft};
pub use error::{OfflineError, Result};
pub use time::{Clock, ManualClock, SystemClock};
