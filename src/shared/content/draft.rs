//! Draft Post Data Structures
//!
//! A draft is a locally queued, not-yet-remotely-persisted user post. Drafts
//! are created while offline and flushed to the remote backend on reconnect.
//!
//! ## State Machine
//!
//! `Draft -> Pending -> Synced (terminal, entry deleted) | Failed`
//!
//! A `Failed` draft re-enters `Pending` on the next reconnect cycle, subject
//! to its backoff window and attempt ceiling. Once the ceiling is reached the
//! draft stays `Failed` until the user retries or discards it.

use serde::{Deserialize, Serialize};

/// Target collection for a draft when it syncs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    /// A comment (or threaded reply) inside a discussion
    Comment,
    /// A new discussion thread
    Discussion,
    /// A course announcement
    Announcement,
}

impl DraftKind {
    /// Stable string form for logs and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftKind::Comment => "comment",
            DraftKind::Discussion => "discussion",
            DraftKind::Announcement => "announcement",
        }
    }
}

/// Draft lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Saved locally, not yet attempted
    Draft,
    /// A sync attempt is in flight
    Pending,
    /// The last sync attempt failed
    Failed,
    /// Successfully created remotely (the local entry is deleted)
    Synced,
}

/// A locally queued user post awaiting sync
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftPost {
    /// Locally generated unique id (unknown to the remote backend)
    pub id: String,
    /// Target collection on sync
    pub kind: DraftKind,
    /// User-authored text
    pub content: String,
    /// Owning course
    pub course_id: String,
    /// Discussion scope, present for comment/reply drafts
    #[serde(default)]
    pub discussion_id: Option<String>,
    /// Parent comment id, present for threaded replies
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Whether the post should be published anonymously
    #[serde(default)]
    pub is_anonymous: bool,
    /// Author's role in the course at authoring time
    pub author_role: String,
    /// Current lifecycle status
    pub status: DraftStatus,
    /// Creation time in epoch milliseconds, never mutated
    pub created_at: i64,
    /// Number of failed sync attempts so far
    #[serde(default)]
    pub attempts: u32,
    /// Earliest time the next automatic attempt is allowed
    #[serde(default)]
    pub next_attempt_at: Option<i64>,
    /// Error message from the last failed attempt
    #[serde(default)]
    pub last_error: Option<String>,
}

impl DraftPost {
    /// Whether this draft still needs to reach the remote backend
    pub fn is_unsynced(&self) -> bool {
        self.status != DraftStatus::Synced
    }

    /// Whether this draft belongs to the given discussion
    pub fn matches_discussion(&self, discussion_id: &str) -> bool {
        self.discussion_id.as_deref() == Some(discussion_id)
    }
}

/// User input for a new draft
#[derive(Debug, Clone)]
pub struct NewDraft {
    /// Target collection on sync
    pub kind: DraftKind,
    /// User-authored text
    pub content: String,
    /// Owning course
    pub course_id: String,
    /// Discussion scope, required for comment drafts
    pub discussion_id: Option<String>,
    /// Parent comment id for threaded replies
    pub parent_id: Option<String>,
    /// Whether the post should be published anonymously
    pub is_anonymous: bool,
    /// Author's role in the course
    pub author_role: String,
}

impl NewDraft {
    /// Convenience constructor for a comment draft
    pub fn comment(
        course_id: impl Into<String>,
        discussion_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind: DraftKind::Comment,
            content: content.into(),
            course_id: course_id.into(),
            discussion_id: Some(discussion_id.into()),
            parent_id: None,
            is_anonymous: false,
            author_role: "student".to_string(),
        }
    }

    /// Mark this draft as a threaded reply to the given comment
    pub fn in_reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_kind_as_str() {
        assert_eq!(DraftKind::Comment.as_str(), "comment");
        assert_eq!(DraftKind::Discussion.as_str(), "discussion");
        assert_eq!(DraftKind::Announcement.as_str(), "announcement");
    }

    #[test]
    fn test_reply_builder() {
        let draft = NewDraft::comment("c1", "d1", "I agree").in_reply_to("parent-9");
        assert_eq!(draft.parent_id.as_deref(), Some("parent-9"));
        assert_eq!(draft.discussion_id.as_deref(), Some("d1"));
    }

    #[test]
    fn test_draft_status_serializes_snake_case() {
        let json = serde_json::to_string(&DraftStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
