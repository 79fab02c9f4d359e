//! Course Announcement Data Structure

use serde::{Deserialize, Serialize};

/// An announcement posted to a course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Stable identifier matching the remote record
    pub id: String,
    /// Owning course
    pub course_id: String,
    /// Announcement headline
    pub title: String,
    /// Announcement body
    pub content: String,
    /// Author's display name
    pub author_name: String,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}
