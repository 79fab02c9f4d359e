//! Remote Backend Abstraction
//!
//! The hosted document backend is injected behind a single trait so the
//! cache and draft services are written once against an abstraction instead
//! of a concrete SDK binding. The core treats the backend as an opaque async
//! CRUD source plus a push-update primitive; the concrete binding (and its
//! authentication) lives with the application shell.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::shared::content::{Announcement, Comment, CourseResource};
use crate::shared::error::Result;

/// Payload for creating a comment (or threaded reply) remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteComment {
    /// Owning course
    pub course_id: String,
    /// Target discussion
    pub discussion_id: String,
    /// Parent comment id when this is a threaded reply; must be stored
    /// remotely exactly as authored
    pub parent_id: Option<String>,
    /// User-authored text
    pub content: String,
    /// Whether to publish anonymously
    pub is_anonymous: bool,
    /// Author's role in the course
    pub author_role: String,
}

/// Payload for creating a new discussion thread remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteDiscussion {
    /// Owning course
    pub course_id: String,
    /// Opening post text
    pub content: String,
    /// Whether to publish anonymously
    pub is_anonymous: bool,
    /// Author's role in the course
    pub author_role: String,
}

/// Payload for creating a course announcement remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRemoteAnnouncement {
    /// Owning course
    pub course_id: String,
    /// Announcement body
    pub content: String,
    /// Author's role in the course
    pub author_role: String,
}

/// Injected handle to the hosted document backend
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Create a comment; returns the remote record id
    async fn create_comment(&self, new: NewRemoteComment) -> Result<String>;

    /// Create a discussion thread; returns the remote record id
    async fn create_discussion(&self, new: NewRemoteDiscussion) -> Result<String>;

    /// Create an announcement; returns the remote record id
    async fn create_announcement(&self, new: NewRemoteAnnouncement) -> Result<String>;

    /// Fetch the comments of a discussion
    async fn fetch_comments(&self, course_id: &str, discussion_id: &str) -> Result<Vec<Comment>>;

    /// Fetch the announcements of a course
    async fn fetch_announcements(&self, course_id: &str) -> Result<Vec<Announcement>>;

    /// Fetch the resources of a course
    async fn fetch_resources(&self, course_id: &str) -> Result<Vec<CourseResource>>;

    /// Push-update stream of a discussion's comments.
    ///
    /// Each item is the full current batch. Consumed by live screens; the
    /// offline core itself only pulls.
    fn subscribe_comments(
        &self,
        course_id: &str,
        discussion_id: &str,
    ) -> BoxStream<'static, Vec<Comment>>;
}
