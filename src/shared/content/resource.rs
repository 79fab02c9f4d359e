//! Course Resource Data Structure

use serde::{Deserialize, Serialize};

/// A learning resource attached to a course (document, link, video, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseResource {
    /// Stable identifier matching the remote record
    pub id: String,
    /// Owning course
    pub course_id: String,
    /// Resource title
    pub title: String,
    /// Short description shown in resource lists
    #[serde(default)]
    pub description: String,
    /// Location of the resource content
    pub url: String,
    /// Resource category (document, video, link, ...)
    pub category: String,
    /// Creation time in epoch milliseconds
    pub created_at: i64,
}
