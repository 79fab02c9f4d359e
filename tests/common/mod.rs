//! Shared helpers for integration tests
//!
//! Provides a scriptable mock of the remote backend and a scripted
//! connectivity provider so reconnect flows run without any real I/O.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio::sync::RwLock;
use uuid::Uuid;

use lectern::remote::{
    NewRemoteAnnouncement, NewRemoteComment, NewRemoteDiscussion, RemoteBackend,
};
use lectern::shared::content::{Announcement, Comment, CourseResource};
use lectern::shared::error::{OfflineError, Result};
use lectern::shared::time::ManualClock;
use lectern::storage::MemoryStore;
use lectern::sync::{ConnectivityProvider, LinkState};

/// Scriptable in-memory stand-in for the hosted backend
#[derive(Default)]
pub struct MockBackend {
    comments: RwLock<HashMap<(String, String), Vec<Comment>>>,
    announcements: RwLock<HashMap<String, Vec<Announcement>>>,
    resources: RwLock<HashMap<String, Vec<CourseResource>>>,
    created_comments: RwLock<Vec<NewRemoteComment>>,
    fail_markers: RwLock<HashSet<String>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any create whose content contains `marker` fail
    pub async fn fail_on(&self, marker: &str) {
        self.fail_markers.write().await.insert(marker.to_string());
    }

    pub async fn clear_failures(&self) {
        self.fail_markers.write().await.clear();
    }

    /// Fixture for `fetch_comments`
    pub async fn set_comments(&self, course_id: &str, discussion_id: &str, batch: Vec<Comment>) {
        self.comments
            .write()
            .await
            .insert((course_id.to_string(), discussion_id.to_string()), batch);
    }

    /// Fixture for `fetch_announcements`
    pub async fn set_announcements(&self, course_id: &str, batch: Vec<Announcement>) {
        self.announcements
            .write()
            .await
            .insert(course_id.to_string(), batch);
    }

    /// All comment creates recorded so far
    pub async fn created_comments(&self) -> Vec<NewRemoteComment> {
        self.created_comments.read().await.clone()
    }

    /// Number of replies created in a discussion (comments with a parent)
    pub async fn reply_count(&self, discussion_id: &str) -> usize {
        self.created_comments
            .read()
            .await
            .iter()
            .filter(|c| c.discussion_id == discussion_id && c.parent_id.is_some())
            .count()
    }

    async fn should_fail(&self, content: &str) -> bool {
        self.fail_markers
            .read()
            .await
            .iter()
            .any(|marker| content.contains(marker.as_str()))
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn create_comment(&self, new: NewRemoteComment) -> Result<String> {
        if self.should_fail(&new.content).await {
            return Err(OfflineError::remote("simulated network failure"));
        }
        self.created_comments.write().await.push(new);
        Ok(Uuid::new_v4().to_string())
    }

    async fn create_discussion(&self, new: NewRemoteDiscussion) -> Result<String> {
        if self.should_fail(&new.content).await {
            return Err(OfflineError::remote("simulated network failure"));
        }
        Ok(Uuid::new_v4().to_string())
    }

    async fn create_announcement(&self, new: NewRemoteAnnouncement) -> Result<String> {
        if self.should_fail(&new.content).await {
            return Err(OfflineError::remote("simulated network failure"));
        }
        Ok(Uuid::new_v4().to_string())
    }

    async fn fetch_comments(&self, course_id: &str, discussion_id: &str) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .read()
            .await
            .get(&(course_id.to_string(), discussion_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_announcements(&self, course_id: &str) -> Result<Vec<Announcement>> {
        Ok(self
            .announcements
            .read()
            .await
            .get(course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_resources(&self, course_id: &str) -> Result<Vec<CourseResource>> {
        Ok(self
            .resources
            .read()
            .await
            .get(course_id)
            .cloned()
            .unwrap_or_default())
    }

    fn subscribe_comments(
        &self,
        _course_id: &str,
        _discussion_id: &str,
    ) -> BoxStream<'static, Vec<Comment>> {
        Box::pin(futures_util::stream::empty())
    }
}

/// Connectivity provider that replays a fixed sequence of link states
pub struct ScriptedConnectivity {
    initial: LinkState,
    events: Vec<LinkState>,
}

#[allow(dead_code)]
impl ScriptedConnectivity {
    pub fn new(initial: LinkState, events: Vec<LinkState>) -> Self {
        Self { initial, events }
    }
}

#[async_trait]
impl ConnectivityProvider for ScriptedConnectivity {
    async fn current(&self) -> LinkState {
        self.initial
    }

    fn subscribe(&self) -> BoxStream<'static, LinkState> {
        Box::pin(futures_util::stream::iter(self.events.clone()))
    }
}

/// Install a tracing subscriber for test output (idempotent)
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory store
#[allow(dead_code)]
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Manual clock starting at an arbitrary but fixed epoch
#[allow(dead_code)]
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(1_700_000_000_000))
}

/// Comment fixture builder
#[allow(dead_code)]
pub fn comment(id: &str, discussion_id: &str, course_id: &str, created_at: i64) -> Comment {
    Comment {
        id: id.to_string(),
        discussion_id: discussion_id.to_string(),
        course_id: course_id.to_string(),
        parent_id: None,
        content: format!("comment {}", id),
        author_id: "u1".to_string(),
        author_name: "Ada".to_string(),
        author_role: "student".to_string(),
        is_anonymous: false,
        created_at,
    }
}
