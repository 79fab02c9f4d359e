//! Discussion Comment Data Structure
//!
//! Represents a comment inside a course discussion. Comments form threads
//! through the optional `parent_id` reference.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment in a course discussion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Stable identifier matching the remote record
    pub id: String,
    /// Discussion this comment belongs to
    pub discussion_id: String,
    /// Owning course
    pub course_id: String,
    /// Parent comment id when this is a threaded reply
    #[serde(default)]
    pub parent_id: Option<String>,
    /// User-authored text
    pub content: String,
    /// Author's user id
    pub author_id: String,
    /// Author's display name
    pub author_name: String,
    /// Author's role in the course (student, instructor, ...)
    pub author_role: String,
    /// Whether the author chose to post anonymously
    #[serde(default)]
    pub is_anonymous: bool,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}

impl Comment {
    /// Create a new top-level comment
    pub fn new(
        discussion_id: impl Into<String>,
        course_id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            discussion_id: discussion_id.into(),
            course_id: course_id.into(),
            parent_id: None,
            content: content.into(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            author_role: "student".to_string(),
            is_anonymous: false,
            created_at,
        }
    }

    /// Whether this comment is a threaded reply
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}
