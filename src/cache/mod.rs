//! # Offline Cache Service
//!
//! Write-through cache of remote course content, serving reads while
//! disconnected and silently refreshing when online.
//!
//! ## Storage Layout
//!
//! Each scope is one JSON blob in the key-value store holding an id-keyed
//! map of [`Cached`] wrappers:
//!
//! - `cache:comments:{discussion_id}`
//! - `cache:announcements:{course_id}`
//! - `cache:resources:{course_id}`
//! - `cache:meta` - the singleton [`CacheMetadata`] record
//!
//! ## Semantics
//!
//! - Writes upsert every item in the batch and stamp `last_updated` to now;
//!   items absent from the batch are retained until an explicit prune or
//!   eviction removes them.
//! - Reads never fail: a missing scope is an empty batch (common on a
//!   device that has never been online), a corrupted scope is dropped and
//!   read as empty.
//! - Writes to the same scope are last-write-wins; there is no version
//!   vector or compare-and-swap.
//! - Staleness is informational only and never blocks reads.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::remote::RemoteBackend;
use crate::shared::config::OfflineConfig;
use crate::shared::content::{Announcement, Cached, Comment, CourseResource};
use crate::shared::error::Result;
use crate::shared::time::Clock;
use crate::storage::KeyValueStore;

/// Cache bookkeeping record
pub mod metadata;

pub use metadata::CacheMetadata;

const CACHE_PREFIX: &str = "cache:";
const META_KEY: &str = "cache:meta";
const COMMENTS_PREFIX: &str = "cache:comments:";
const ANNOUNCEMENTS_PREFIX: &str = "cache:announcements:";
const RESOURCES_PREFIX: &str = "cache:resources:";

fn comments_key(discussion_id: &str) -> String {
    format!("{}{}", COMMENTS_PREFIX, discussion_id)
}

fn announcements_key(course_id: &str) -> String {
    format!("{}{}", ANNOUNCEMENTS_PREFIX, course_id)
}

fn resources_key(course_id: &str) -> String {
    format!("{}{}", RESOURCES_PREFIX, course_id)
}

/// Item counts per cached collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSizeReport {
    /// Cached comments across all discussions
    pub comments: usize,
    /// Cached announcements across all courses
    pub announcements: usize,
    /// Cached resources across all courses
    pub resources: usize,
}

impl CacheSizeReport {
    /// Total cached items
    pub fn total(&self) -> usize {
        self.comments + self.announcements + self.resources
    }

    /// Whether nothing is cached (drives the "empty cache" UI state)
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Write-through cache over the local key-value store
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn RemoteBackend>,
    config: OfflineConfig,
    clock: Arc<dyn Clock>,
}

impl CacheService {
    /// Create a cache service over the given store and backend
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn RemoteBackend>,
        config: OfflineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            clock,
        }
    }

    /// Idempotent process-wide setup.
    ///
    /// Checks the stored schema version; on mismatch (or missing/corrupt
    /// metadata) every cached collection is discarded and fresh metadata is
    /// written. Safe to call on every app foreground.
    ///
    /// # Errors
    ///
    /// Propagates storage failures so the application can fall back to a
    /// no-offline-support mode.
    pub async fn initialize(&self) -> Result<()> {
        let stored = match self.store.get(META_KEY).await? {
            Some(raw) => serde_json::from_str::<CacheMetadata>(&raw).ok(),
            None => None,
        };

        match stored {
            Some(meta) if meta.schema_version == self.config.schema_version => {
                tracing::debug!(version = meta.schema_version, "cache: schema up to date");
                Ok(())
            }
            stored => {
                tracing::info!(
                    stored = ?stored.map(|m| m.schema_version),
                    expected = self.config.schema_version,
                    "cache: schema mismatch, rebuilding from zero"
                );
                self.clear_all().await
            }
        }
    }

    /// Write a batch of comments for a discussion.
    ///
    /// Every item in the batch is stamped `last_updated = now` and fully
    /// replaces any previous entry with the same id. Items already cached
    /// but absent from the batch are retained.
    pub async fn cache_comments(
        &self,
        discussion_id: &str,
        course_id: &str,
        comments: &[Comment],
    ) -> Result<()> {
        self.write_batch(&comments_key(discussion_id), course_id, comments, |c| {
            c.id.clone()
        })
        .await
    }

    /// Write a batch of announcements for a course
    pub async fn cache_announcements(
        &self,
        course_id: &str,
        announcements: &[Announcement],
    ) -> Result<()> {
        self.write_batch(&announcements_key(course_id), course_id, announcements, |a| {
            a.id.clone()
        })
        .await
    }

    /// Write a batch of resources for a course
    pub async fn cache_resources(
        &self,
        course_id: &str,
        resources: &[CourseResource],
    ) -> Result<()> {
        self.write_batch(&resources_key(course_id), course_id, resources, |r| {
            r.id.clone()
        })
        .await
    }

    /// Cached comments for a discussion, oldest first; empty if never cached
    pub async fn get_cached_comments(&self, discussion_id: &str) -> Vec<Cached<Comment>> {
        let mut items: Vec<Cached<Comment>> = self
            .read_scope(&comments_key(discussion_id))
            .await
            .into_values()
            .collect();
        items.sort_by(|a, b| {
            a.item
                .created_at
                .cmp(&b.item.created_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        items
    }

    /// Cached announcements for a course, newest first; empty if never cached
    pub async fn get_cached_announcements(&self, course_id: &str) -> Vec<Cached<Announcement>> {
        let mut items: Vec<Cached<Announcement>> = self
            .read_scope(&announcements_key(course_id))
            .await
            .into_values()
            .collect();
        items.sort_by(|a, b| {
            b.item
                .created_at
                .cmp(&a.item.created_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        items
    }

    /// Cached resources for a course, newest first; empty if never cached
    pub async fn get_cached_resources(&self, course_id: &str) -> Vec<Cached<CourseResource>> {
        let mut items: Vec<Cached<CourseResource>> = self
            .read_scope(&resources_key(course_id))
            .await
            .into_values()
            .collect();
        items.sort_by(|a, b| {
            b.item
                .created_at
                .cmp(&a.item.created_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        items
    }

    /// Re-fetch a discussion's comments from the remote backend and write
    /// them through the cache. Returns the fetched item count.
    pub async fn refresh_comments(&self, discussion_id: &str, course_id: &str) -> Result<usize> {
        let fetched = self.backend.fetch_comments(course_id, discussion_id).await?;
        self.cache_comments(discussion_id, course_id, &fetched).await?;
        Ok(fetched.len())
    }

    /// Re-fetch a course's announcements and write them through the cache
    pub async fn refresh_announcements(&self, course_id: &str) -> Result<usize> {
        let fetched = self.backend.fetch_announcements(course_id).await?;
        self.cache_announcements(course_id, &fetched).await?;
        Ok(fetched.len())
    }

    /// Re-fetch a course's resources and write them through the cache
    pub async fn refresh_resources(&self, course_id: &str) -> Result<usize> {
        let fetched = self.backend.fetch_resources(course_id).await?;
        self.cache_resources(course_id, &fetched).await?;
        Ok(fetched.len())
    }

    /// Explicitly drop cached comments not present in `keep_ids`.
    ///
    /// This is the only way entries that disappeared remotely leave a
    /// scope; batch writes deliberately retain them.
    pub async fn prune_comments(&self, discussion_id: &str, keep_ids: &[&str]) -> Result<usize> {
        let key = comments_key(discussion_id);
        let mut map: HashMap<String, Cached<Comment>> = self.read_scope(&key).await;

        let before = map.len();
        map.retain(|id, _| keep_ids.contains(&id.as_str()));
        let removed = before - map.len();

        if removed > 0 {
            if map.is_empty() {
                self.store.remove(&key).await?;
            } else {
                self.write_scope(&key, &map).await?;
            }
            tracing::debug!(discussion_id, removed, "cache: pruned comments");
        }
        Ok(removed)
    }

    /// Stamp the last successful sync to now
    pub async fn update_last_sync_time(&self) -> Result<()> {
        let mut meta = self.read_metadata().await.unwrap_or_else(|| {
            CacheMetadata::new(self.config.schema_version)
        });
        meta.last_sync_time = self.clock.now_millis();
        self.store
            .set(META_KEY, &serde_json::to_string(&meta)?)
            .await
    }

    /// Last successful sync in epoch milliseconds, if any
    pub async fn last_sync_time(&self) -> Option<i64> {
        self.read_metadata()
            .await
            .filter(CacheMetadata::has_synced)
            .map(|meta| meta.last_sync_time)
    }

    /// Whether cached content is older than the configured threshold.
    ///
    /// Informational only; stale content is still served. A cache that has
    /// never synced counts as stale.
    pub async fn is_cache_stale(&self) -> bool {
        match self.last_sync_time().await {
            Some(last) => self.clock.now_millis() - last > self.config.staleness_threshold_ms,
            None => true,
        }
    }

    /// Item counts per collection, for the cache-statistics display
    pub async fn get_cache_size(&self) -> CacheSizeReport {
        CacheSizeReport {
            comments: self.count_collection(COMMENTS_PREFIX).await,
            announcements: self.count_collection(ANNOUNCEMENTS_PREFIX).await,
            resources: self.count_collection(RESOURCES_PREFIX).await,
        }
    }

    /// Discard every cached collection and reset metadata.
    ///
    /// Draft posts are user data, not cache, and are untouched.
    pub async fn clear_all(&self) -> Result<()> {
        for key in self.store.keys_with_prefix(CACHE_PREFIX).await? {
            self.store.remove(&key).await?;
        }
        let meta = CacheMetadata::new(self.config.schema_version);
        self.store
            .set(META_KEY, &serde_json::to_string(&meta)?)
            .await
    }

    /// Evict all cached data belonging to one course, leaving other
    /// courses' data intact.
    pub async fn remove_course_cache(&self, course_id: &str) -> Result<()> {
        self.store.remove(&announcements_key(course_id)).await?;
        self.store.remove(&resources_key(course_id)).await?;

        // Comment scopes are keyed by discussion; filter each by the
        // course recorded on the wrapper.
        for key in self.store.keys_with_prefix(COMMENTS_PREFIX).await? {
            let mut map: HashMap<String, Cached<Comment>> = self.read_scope(&key).await;
            let before = map.len();
            map.retain(|_, cached| cached.course_id != course_id);

            if map.len() == before {
                continue;
            }
            if map.is_empty() {
                self.store.remove(&key).await?;
            } else {
                self.write_scope(&key, &map).await?;
            }
        }

        tracing::debug!(course_id, "cache: removed course data");
        Ok(())
    }

    async fn read_metadata(&self) -> Option<CacheMetadata> {
        match self.store.get(META_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "cache: failed to read metadata");
                None
            }
        }
    }

    /// Read a scope's id-keyed map, treating absence and corruption as
    /// empty. A corrupted blob is removed so it does not fail repeatedly.
    async fn read_scope<T: DeserializeOwned>(&self, key: &str) -> HashMap<String, Cached<T>> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(key, error = %err, "cache: corrupt entry, dropping");
                    let _ = self.store.remove(key).await;
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(err) => {
                tracing::warn!(key, error = %err, "cache: read failed, serving empty");
                HashMap::new()
            }
        }
    }

    async fn write_scope<T: Serialize>(
        &self,
        key: &str,
        map: &HashMap<String, Cached<T>>,
    ) -> Result<()> {
        self.store.set(key, &serde_json::to_string(map)?).await
    }

    async fn write_batch<T, F>(
        &self,
        key: &str,
        course_id: &str,
        items: &[T],
        id_of: F,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&T) -> String,
    {
        let mut map: HashMap<String, Cached<T>> = self.read_scope(key).await;
        let now = self.clock.now_millis();

        for item in items {
            map.insert(
                id_of(item),
                Cached {
                    item: item.clone(),
                    course_id: course_id.to_string(),
                    last_updated: now,
                },
            );
        }

        self.write_scope(key, &map).await
    }

    async fn count_collection(&self, prefix: &str) -> usize {
        let keys = match self.store.keys_with_prefix(prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(prefix, error = %err, "cache: size scan failed");
                return 0;
            }
        };

        let mut total = 0;
        for key in keys {
            if let Ok(Some(raw)) = self.store.get(&key).await {
                if let Ok(map) = serde_json::from_str::<HashMap<String, serde_json::Value>>(&raw) {
                    total += map.len();
                }
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream::BoxStream;

    use crate::shared::time::ManualClock;
    use crate::storage::MemoryStore;

    /// Backend stub that serves fixed comment batches
    struct StubBackend {
        comments: Vec<Comment>,
    }

    #[async_trait]
    impl RemoteBackend for StubBackend {
        async fn create_comment(&self, _new: crate::remote::NewRemoteComment) -> Result<String> {
            Ok("remote-id".to_string())
        }

        async fn create_discussion(
            &self,
            _new: crate::remote::NewRemoteDiscussion,
        ) -> Result<String> {
            Ok("remote-id".to_string())
        }

        async fn create_announcement(
            &self,
            _new: crate::remote::NewRemoteAnnouncement,
        ) -> Result<String> {
            Ok("remote-id".to_string())
        }

        async fn fetch_comments(
            &self,
            _course_id: &str,
            _discussion_id: &str,
        ) -> Result<Vec<Comment>> {
            Ok(self.comments.clone())
        }

        async fn fetch_announcements(&self, _course_id: &str) -> Result<Vec<Announcement>> {
            Ok(Vec::new())
        }

        async fn fetch_resources(&self, _course_id: &str) -> Result<Vec<CourseResource>> {
            Ok(Vec::new())
        }

        fn subscribe_comments(
            &self,
            _course_id: &str,
            _discussion_id: &str,
        ) -> BoxStream<'static, Vec<Comment>> {
            Box::pin(futures_util::stream::empty())
        }
    }

    fn comment(id: &str, created_at: i64) -> Comment {
        Comment {
            id: id.to_string(),
            discussion_id: "d1".to_string(),
            course_id: "c1".to_string(),
            parent_id: None,
            content: "text".to_string(),
            author_id: "u1".to_string(),
            author_name: "Ada".to_string(),
            author_role: "student".to_string(),
            is_anonymous: false,
            created_at,
        }
    }

    fn service_with(
        comments: Vec<Comment>,
    ) -> (CacheService, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let service = CacheService::new(
            store.clone(),
            Arc::new(StubBackend { comments }),
            OfflineConfig::default(),
            clock.clone(),
        );
        (service, store, clock)
    }

    #[tokio::test]
    async fn test_missing_scope_reads_empty() {
        let (service, _, _) = service_with(Vec::new());
        assert!(service.get_cached_comments("never-seen").await.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_roundtrip() {
        let (service, _, _) = service_with(Vec::new());

        service
            .cache_comments("d1", "c1", &[comment("a", 10), comment("b", 20)])
            .await
            .unwrap();

        let cached = service.get_cached_comments("d1").await;
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].item.id, "a");
        assert_eq!(cached[0].last_updated, 1_000);
    }

    #[tokio::test]
    async fn test_rewrite_stamps_new_timestamp_on_all_items() {
        let (service, _, clock) = service_with(Vec::new());
        let batch = vec![comment("a", 10), comment("b", 20), comment("c", 30)];

        service.cache_comments("d1", "c1", &batch).await.unwrap();
        clock.advance(5_000);
        service.cache_comments("d1", "c1", &batch).await.unwrap();

        let cached = service.get_cached_comments("d1").await;
        assert_eq!(cached.len(), 3);
        assert!(cached.iter().all(|c| c.last_updated == 6_000));
    }

    #[tokio::test]
    async fn test_absent_items_are_retained_until_pruned() {
        let (service, _, _) = service_with(Vec::new());

        service
            .cache_comments("d1", "c1", &[comment("a", 10), comment("b", 20)])
            .await
            .unwrap();
        // A partial fetch writes only one item; the other survives.
        service
            .cache_comments("d1", "c1", &[comment("a", 10)])
            .await
            .unwrap();
        assert_eq!(service.get_cached_comments("d1").await.len(), 2);

        let removed = service.prune_comments("d1", &["a"]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(service.get_cached_comments("d1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_scope_reads_empty_and_is_cleared() {
        let (service, store, _) = service_with(Vec::new());

        store
            .set("cache:comments:d1", "{ not json ]")
            .await
            .unwrap();

        assert!(service.get_cached_comments("d1").await.is_empty());
        // The corrupt blob was removed so it will not fail again.
        assert_eq!(store.get("cache:comments:d1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (service, _, _) = service_with(Vec::new());

        service.initialize().await.unwrap();
        service
            .cache_comments("d1", "c1", &[comment("a", 10)])
            .await
            .unwrap();

        service.initialize().await.unwrap();
        assert_eq!(service.get_cached_comments("d1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_mismatch_wipes_cache() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let backend = Arc::new(StubBackend { comments: Vec::new() });

        let v1 = CacheService::new(
            store.clone(),
            backend.clone(),
            OfflineConfig::default(),
            clock.clone(),
        );
        v1.initialize().await.unwrap();
        v1.cache_comments("d1", "c1", &[comment("a", 10)]).await.unwrap();

        let v2_config = OfflineConfig::builder().schema_version(2).build().unwrap();
        let v2 = CacheService::new(store, backend, v2_config, clock);
        v2.initialize().await.unwrap();

        assert!(v2.get_cached_comments("d1").await.is_empty());
    }

    #[tokio::test]
    async fn test_staleness_threshold() {
        let (service, _, clock) = service_with(Vec::new());
        service.initialize().await.unwrap();

        // Never synced counts as stale.
        assert!(service.is_cache_stale().await);

        service.update_last_sync_time().await.unwrap();
        assert!(!service.is_cache_stale().await);

        clock.advance(25 * 60 * 60 * 1000);
        assert!(service.is_cache_stale().await);
    }

    #[tokio::test]
    async fn test_refresh_comments_writes_through() {
        let (service, _, _) = service_with(vec![comment("r1", 10), comment("r2", 20)]);

        let count = service.refresh_comments("d1", "c1").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(service.get_cached_comments("d1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_size_counts_collections() {
        let (service, _, _) = service_with(Vec::new());

        service
            .cache_comments("d1", "c1", &[comment("a", 10), comment("b", 20)])
            .await
            .unwrap();
        service
            .cache_announcements(
                "c1",
                &[Announcement {
                    id: "ann1".to_string(),
                    course_id: "c1".to_string(),
                    title: "Welcome".to_string(),
                    content: "hello".to_string(),
                    author_name: "Prof".to_string(),
                    created_at: 50,
                }],
            )
            .await
            .unwrap();

        let report = service.get_cache_size().await;
        assert_eq!(report.comments, 2);
        assert_eq!(report.announcements, 1);
        assert_eq!(report.resources, 0);
        assert_eq!(report.total(), 3);
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn test_remove_course_cache_leaves_other_courses_intact() {
        let (service, _, _) = service_with(Vec::new());

        let mut other = comment("x", 10);
        other.course_id = "c2".to_string();

        service
            .cache_comments("d1", "c1", &[comment("a", 10)])
            .await
            .unwrap();
        service.cache_comments("d2", "c2", &[other]).await.unwrap();

        service.remove_course_cache("c1").await.unwrap();

        assert!(service.get_cached_comments("d1").await.is_empty());
        assert_eq!(service.get_cached_comments("d2").await.len(), 1);
    }
}
