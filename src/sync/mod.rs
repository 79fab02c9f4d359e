//! # Sync Module
//!
//! Connectivity monitoring and the reconnect coordinator.
//!
//! ## Data Flow
//!
//! Screens check the [`NetworkMonitor`] on mount: online reads fetch from
//! the remote backend and write through the cache, offline reads come from
//! the cache, and offline submissions land in the draft queue. When the
//! monitor observes an offline-to-online transition the
//! [`SyncCoordinator`] flushes queued drafts and refreshes stale cached
//! scopes.
//!
//! ## Lifetime
//!
//! The coordinator is constructed once at application start with its
//! dependencies injected, and torn down (dropped) on logout. It is the sole
//! consumer that reacts to reconnect edges with a sync, so multiple screens
//! observing the same transition cannot trigger duplicate flushes.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::cache::CacheService;
use crate::drafts::{DraftManager, SyncReport};

/// Network status monitoring
pub mod network_monitor;

pub use network_monitor::{
    ConnectivityProvider, LinkState, NetworkMonitor, NetworkState,
};

/// A discussion whose comments a screen currently displays
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentScope {
    /// Owning course
    pub course_id: String,
    /// Discussion whose comments are tracked
    pub discussion_id: String,
}

/// Outcome of one reconnect cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectReport {
    /// Draft flush result
    pub drafts: SyncReport,
    /// Cached scopes refreshed from the remote backend
    pub refreshed_scopes: usize,
    /// Scope refreshes that failed (logged, not raised)
    pub refresh_failures: usize,
}

/// Reacts to reconnect events by flushing drafts and refreshing the cache
pub struct SyncCoordinator {
    drafts: Arc<DraftManager>,
    cache: Arc<CacheService>,
    reconnects: broadcast::Sender<NetworkState>,
    tracked_discussions: RwLock<HashSet<CommentScope>>,
    tracked_courses: RwLock<HashSet<String>>,
}

impl SyncCoordinator {
    /// Create a coordinator wired to the given monitor's reconnect edges
    pub fn new(
        drafts: Arc<DraftManager>,
        cache: Arc<CacheService>,
        monitor: &NetworkMonitor,
    ) -> Self {
        Self {
            drafts,
            cache,
            reconnects: monitor.reconnect_sender(),
            tracked_discussions: RwLock::new(HashSet::new()),
            tracked_courses: RwLock::new(HashSet::new()),
        }
    }

    /// Register a discussion to refresh on reconnect
    pub async fn track_discussion(
        &self,
        course_id: impl Into<String>,
        discussion_id: impl Into<String>,
    ) {
        self.tracked_discussions.write().await.insert(CommentScope {
            course_id: course_id.into(),
            discussion_id: discussion_id.into(),
        });
    }

    /// Stop refreshing a discussion on reconnect
    pub async fn untrack_discussion(&self, course_id: &str, discussion_id: &str) {
        self.tracked_discussions.write().await.remove(&CommentScope {
            course_id: course_id.to_string(),
            discussion_id: discussion_id.to_string(),
        });
    }

    /// Register a course whose announcements and resources refresh on
    /// reconnect
    pub async fn track_course(&self, course_id: impl Into<String>) {
        self.tracked_courses.write().await.insert(course_id.into());
    }

    /// Stop refreshing a course on reconnect
    pub async fn untrack_course(&self, course_id: &str) {
        self.tracked_courses.write().await.remove(course_id);
    }

    /// React to reconnect events until the monitor goes away.
    ///
    /// Intended to be spawned once at application start.
    pub async fn run(&self) {
        let mut reconnects = self.reconnects.subscribe();
        loop {
            match reconnects.recv().await {
                Ok(_) => {
                    self.run_reconnect_cycle().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Coalesced transitions still need exactly one flush.
                    tracing::warn!(skipped, "sync: reconnect events coalesced");
                    self.run_reconnect_cycle().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// One full reconnect cycle: flush drafts, then refresh stale cached
    /// scopes, then stamp the sync time.
    ///
    /// Also callable directly for an explicit manual sync request.
    pub async fn run_reconnect_cycle(&self) -> ReconnectReport {
        let drafts = self.drafts.sync_all_drafts().await;

        let mut refreshed_scopes = 0;
        let mut refresh_failures = 0;

        if self.cache.is_cache_stale().await {
            let discussions: Vec<CommentScope> = self
                .tracked_discussions
                .read()
                .await
                .iter()
                .cloned()
                .collect();
            for scope in discussions {
                match self
                    .cache
                    .refresh_comments(&scope.discussion_id, &scope.course_id)
                    .await
                {
                    Ok(_) => refreshed_scopes += 1,
                    Err(err) => {
                        tracing::warn!(
                            discussion_id = %scope.discussion_id,
                            error = %err,
                            "sync: comment refresh failed"
                        );
                        refresh_failures += 1;
                    }
                }
            }

            let courses: Vec<String> =
                self.tracked_courses.read().await.iter().cloned().collect();
            for course_id in courses {
                for result in [
                    self.cache.refresh_announcements(&course_id).await,
                    self.cache.refresh_resources(&course_id).await,
                ] {
                    match result {
                        Ok(_) => refreshed_scopes += 1,
                        Err(err) => {
                            tracing::warn!(
                                course_id = %course_id,
                                error = %err,
                                "sync: course refresh failed"
                            );
                            refresh_failures += 1;
                        }
                    }
                }
            }
        }

        if refresh_failures == 0 {
            if let Err(err) = self.cache.update_last_sync_time().await {
                tracing::warn!(error = %err, "sync: failed to stamp sync time");
            }
        }

        let report = ReconnectReport {
            drafts,
            refreshed_scopes,
            refresh_failures,
        };
        tracing::info!(
            synced = report.drafts.synced_count,
            failed = report.drafts.failed_count,
            refreshed = report.refreshed_scopes,
            "sync: reconnect cycle finished"
        );
        report
    }
}
