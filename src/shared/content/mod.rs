//! Content Types
//!
//! Domain shapes for course content (comments, announcements, resources),
//! the cache wrapper that carries staleness metadata, and locally queued
//! draft posts. All types serialize with serde and are what the local
//! key-value store persists.

use serde::{Deserialize, Serialize};

/// Discussion comments
pub mod comment;

/// Course announcements
pub mod announcement;

/// Course resources
pub mod resource;

/// Draft posts and their lifecycle
pub mod draft;

/// Comment thread reconstruction
pub mod thread;

pub use announcement::Announcement;
pub use comment::Comment;
pub use draft::{DraftKind, DraftPost, DraftStatus, NewDraft};
pub use resource::CourseResource;
pub use thread::{build_comment_tree, flatten_for_display, CommentNode};

/// A cached copy of a remote item.
///
/// `last_updated` is stamped when the item is written into the cache, not
/// when the item last changed remotely. Writing an existing id replaces the
/// whole wrapper; there is no field-level merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cached<T> {
    /// The mirrored remote record
    pub item: T,
    /// Owning course, used for per-course eviction
    pub course_id: String,
    /// Cache-write time in epoch milliseconds
    pub last_updated: i64,
}
