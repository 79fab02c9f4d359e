//! Cache Metadata
//!
//! Process-wide singleton record tracking when the cache last synced and
//! which schema version wrote it. A stored version that differs from the
//! running code's expected version discards the entire cache - full rebuild
//! is the only migration strategy.

use serde::{Deserialize, Serialize};

/// Singleton cache bookkeeping record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheMetadata {
    /// Last successful sync in epoch milliseconds; 0 means never synced
    pub last_sync_time: i64,
    /// Schema version that wrote the cached collections
    pub schema_version: u32,
}

impl CacheMetadata {
    /// Fresh metadata for a just-initialized (or just-wiped) cache
    pub fn new(schema_version: u32) -> Self {
        Self {
            last_sync_time: 0,
            schema_version,
        }
    }

    /// Whether the cache has ever completed a sync
    pub fn has_synced(&self) -> bool {
        self.last_sync_time > 0
    }
}
