//! # Draft Manager
//!
//! Durable local queue of not-yet-submitted user posts, with idempotent
//! submission on reconnect.
//!
//! ## State Machine
//!
//! `Draft -> Pending -> Synced (terminal, entry deleted) | Failed`
//!
//! A `Failed` draft re-enters `Pending` on the next reconnect cycle once its
//! backoff window has passed. After the attempt ceiling the draft stays
//! `Failed` until the user retries or discards it.
//!
//! ## Ordering
//!
//! `sync_all_drafts` processes drafts strictly oldest-first and
//! sequentially, so authoring order is preserved remotely. One draft's
//! failure never aborts the batch; results are reported in aggregate.
//!
//! The queue lives under a single key in the local store; every mutation is
//! a full-blob rewrite, persisted before and after each remote attempt so a
//! crash mid-sync leaves a consistent queue.

use std::sync::Arc;

use uuid::Uuid;

use crate::remote::{
    NewRemoteAnnouncement, NewRemoteComment, NewRemoteDiscussion, RemoteBackend,
};
use crate::shared::config::OfflineConfig;
use crate::shared::content::{DraftKind, DraftPost, DraftStatus, NewDraft};
use crate::shared::error::{OfflineError, Result};
use crate::shared::time::Clock;
use crate::storage::KeyValueStore;

/// Retry backoff policy
pub mod backoff;

pub use backoff::BackoffPolicy;

const DRAFTS_KEY: &str = "drafts:queue";

/// Aggregate result of one sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Drafts created remotely and removed locally
    pub synced_count: usize,
    /// Drafts attempted and failed this pass
    pub failed_count: usize,
    /// Drafts skipped: still inside their backoff window or past the
    /// attempt ceiling
    pub deferred_count: usize,
}

/// Durable queue of unsent posts
pub struct DraftManager {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn RemoteBackend>,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
}

impl DraftManager {
    /// Create a draft manager over the given store and backend
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn RemoteBackend>,
        config: &OfflineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            backend,
            backoff: BackoffPolicy::from_config(config),
            clock,
        }
    }

    /// Validate and persist a new draft; returns its local id.
    ///
    /// Never touches the network.
    ///
    /// # Errors
    ///
    /// Returns a validation error when required fields for the draft kind
    /// are missing, or a storage error if the queue cannot be persisted.
    pub async fn save_draft(&self, new: NewDraft) -> Result<String> {
        validate(&new)?;

        let draft = DraftPost {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            content: new.content,
            course_id: new.course_id,
            discussion_id: new.discussion_id,
            parent_id: new.parent_id,
            is_anonymous: new.is_anonymous,
            author_role: new.author_role,
            status: DraftStatus::Draft,
            created_at: self.clock.now_millis(),
            attempts: 0,
            next_attempt_at: None,
            last_error: None,
        };
        let id = draft.id.clone();

        let mut drafts = self.load().await;
        drafts.push(draft);
        self.persist(&drafts).await?;

        tracing::debug!(id = %id, kind = new.kind.as_str(), "drafts: saved");
        Ok(id)
    }

    /// All unsynced drafts for a discussion, oldest first, any status.
    ///
    /// Rendered by screens as provisional items alongside server-backed
    /// content.
    pub async fn get_drafts_by_discussion(&self, discussion_id: &str) -> Vec<DraftPost> {
        let mut drafts: Vec<DraftPost> = self
            .load()
            .await
            .into_iter()
            .filter(|d| d.is_unsynced() && d.matches_discussion(discussion_id))
            .collect();
        sort_by_creation(&mut drafts);
        drafts
    }

    /// All unsynced drafts, oldest first
    pub async fn get_all_drafts(&self) -> Vec<DraftPost> {
        let mut drafts: Vec<DraftPost> = self
            .load()
            .await
            .into_iter()
            .filter(DraftPost::is_unsynced)
            .collect();
        sort_by_creation(&mut drafts);
        drafts
    }

    /// Number of drafts waiting to sync
    pub async fn queued_count(&self) -> usize {
        self.load().await.iter().filter(|d| d.is_unsynced()).count()
    }

    /// Remove a draft without syncing it; returns whether it existed
    pub async fn discard_draft(&self, id: &str) -> Result<bool> {
        let mut drafts = self.load().await;
        let before = drafts.len();
        drafts.retain(|d| d.id != id);

        if drafts.len() == before {
            return Ok(false);
        }
        self.persist(&drafts).await?;
        Ok(true)
    }

    /// Re-arm a draft whose automatic retries were exhausted; returns
    /// whether it existed
    pub async fn retry_draft(&self, id: &str) -> Result<bool> {
        let mut drafts = self.load().await;
        let Some(draft) = drafts.iter_mut().find(|d| d.id == id) else {
            return Ok(false);
        };

        draft.status = DraftStatus::Draft;
        draft.attempts = 0;
        draft.next_attempt_at = None;
        draft.last_error = None;

        self.persist(&drafts).await?;
        Ok(true)
    }

    /// Flush the queue to the remote backend.
    ///
    /// Drafts are processed strictly in creation order, sequentially. A
    /// failing draft is marked `Failed` with its backoff window scheduled
    /// and the pass continues with the next draft. Failures are reported in
    /// the aggregate result, never raised.
    pub async fn sync_all_drafts(&self) -> SyncReport {
        let now = self.clock.now_millis();
        let mut queue = self.load().await;
        sort_by_creation(&mut queue);

        let ids: Vec<String> = queue.iter().map(|d| d.id.clone()).collect();
        let mut report = SyncReport::default();

        for id in ids {
            let Some(index) = queue.iter().position(|d| d.id == id) else {
                continue;
            };

            if self.backoff.is_exhausted(queue[index].attempts) {
                tracing::debug!(id = %id, "drafts: attempts exhausted, awaiting manual retry");
                report.deferred_count += 1;
                continue;
            }
            if queue[index].next_attempt_at.is_some_and(|at| at > now) {
                report.deferred_count += 1;
                continue;
            }

            queue[index].status = DraftStatus::Pending;
            if let Err(err) = self.persist(&queue).await {
                tracing::warn!(error = %err, "drafts: failed to persist pending state");
            }

            match self.submit(&queue[index]).await {
                Ok(remote_id) => {
                    tracing::debug!(id = %id, remote_id = %remote_id, "drafts: synced");
                    queue.remove(index);
                    report.synced_count += 1;
                }
                Err(err) => {
                    let draft = &mut queue[index];
                    draft.status = DraftStatus::Failed;
                    draft.attempts += 1;
                    draft.next_attempt_at = Some(now + self.backoff.delay_for(draft.attempts));
                    draft.last_error = Some(err.to_string());
                    tracing::warn!(
                        id = %id,
                        attempts = draft.attempts,
                        error = %err,
                        "drafts: sync attempt failed"
                    );
                    report.failed_count += 1;
                }
            }

            if let Err(err) = self.persist(&queue).await {
                tracing::warn!(error = %err, "drafts: failed to persist queue");
            }
        }

        tracing::info!(
            synced = report.synced_count,
            failed = report.failed_count,
            deferred = report.deferred_count,
            "drafts: sync pass finished"
        );
        report
    }

    /// Create one draft remotely, dispatching on its kind
    async fn submit(&self, draft: &DraftPost) -> Result<String> {
        match draft.kind {
            DraftKind::Comment => {
                let discussion_id = draft.discussion_id.clone().ok_or_else(|| {
                    OfflineError::validation("discussion_id", "comment draft lost its discussion")
                })?;
                self.backend
                    .create_comment(NewRemoteComment {
                        course_id: draft.course_id.clone(),
                        discussion_id,
                        parent_id: draft.parent_id.clone(),
                        content: draft.content.clone(),
                        is_anonymous: draft.is_anonymous,
                        author_role: draft.author_role.clone(),
                    })
                    .await
            }
            DraftKind::Discussion => {
                self.backend
                    .create_discussion(NewRemoteDiscussion {
                        course_id: draft.course_id.clone(),
                        content: draft.content.clone(),
                        is_anonymous: draft.is_anonymous,
                        author_role: draft.author_role.clone(),
                    })
                    .await
            }
            DraftKind::Announcement => {
                self.backend
                    .create_announcement(NewRemoteAnnouncement {
                        course_id: draft.course_id.clone(),
                        content: draft.content.clone(),
                        author_role: draft.author_role.clone(),
                    })
                    .await
            }
        }
    }

    /// Load the queue, treating absence and corruption as empty.
    ///
    /// A corrupt queue blob is removed so it does not fail repeatedly.
    async fn load(&self) -> Vec<DraftPost> {
        match self.store.get(DRAFTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(drafts) => drafts,
                Err(err) => {
                    tracing::warn!(error = %err, "drafts: corrupt queue, dropping");
                    let _ = self.store.remove(DRAFTS_KEY).await;
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "drafts: read failed, serving empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self, drafts: &[DraftPost]) -> Result<()> {
        self.store
            .set(DRAFTS_KEY, &serde_json::to_string(drafts)?)
            .await
    }
}

fn sort_by_creation(drafts: &mut [DraftPost]) {
    drafts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

fn validate(new: &NewDraft) -> Result<()> {
    if new.content.trim().is_empty() {
        return Err(OfflineError::validation("content", "cannot be empty"));
    }
    if new.course_id.is_empty() {
        return Err(OfflineError::validation("course_id", "required"));
    }
    if new.kind == DraftKind::Comment
        && new.discussion_id.as_deref().map_or(true, str::is_empty)
    {
        return Err(OfflineError::validation(
            "discussion_id",
            "comment drafts require a discussion id",
        ));
    }
    Ok(())
}
