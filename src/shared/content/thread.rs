//! Comment Thread Reconstruction
//!
//! Rebuilds a nested comment tree from the flat comment lists stored in the
//! cache and returned by the remote backend. The cached and live paths share
//! this exact algorithm so both render identically:
//!
//! 1. Comments referencing an unknown `parent_id` (e.g. parent deleted) are
//!    promoted to top level rather than dropped.
//! 2. Top-level comments sort newest-first.
//! 3. Replies within a comment sort oldest-first, recursively.
//!
//! Ordering is deterministic for any permutation of the input batch: ties on
//! `created_at` break on the comment id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::shared::content::Comment;

/// A comment with its nested replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentNode {
    /// The comment itself
    pub comment: Comment,
    /// Direct replies, oldest first
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Total number of comments in this subtree, including self
    pub fn len(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::len).sum::<usize>()
    }

    /// Whether the subtree holds only this comment
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

/// Build a nested comment tree from a flat batch.
///
/// A comment whose `parent_id` does not resolve to another comment in the
/// same batch (or points at itself) becomes a top-level comment.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let known: HashSet<&str> = comments.iter().map(|c| c.id.as_str()).collect();

    let mut children: HashMap<String, Vec<Comment>> = HashMap::new();
    let mut roots: Vec<Comment> = Vec::new();

    for comment in comments {
        let resolvable_parent = comment
            .parent_id
            .as_deref()
            .filter(|parent| known.contains(parent) && *parent != comment.id);

        match resolvable_parent {
            Some(parent) => children
                .entry(parent.to_string())
                .or_default()
                .push(comment.clone()),
            None => roots.push(comment.clone()),
        }
    }

    // Newest first at the top level.
    roots.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children))
        .collect()
}

/// Recursively attach replies, oldest first within each comment
fn attach_replies(comment: Comment, children: &mut HashMap<String, Vec<Comment>>) -> CommentNode {
    let mut replies = children.remove(&comment.id).unwrap_or_default();
    replies.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    CommentNode {
        replies: replies
            .into_iter()
            .map(|reply| attach_replies(reply, children))
            .collect(),
        comment,
    }
}

/// Depth-first flatten for rendering.
///
/// Each entry carries the indentation depth to draw at, capped at
/// `max_depth`. The cap limits visual nesting only; every comment in the
/// tree appears in the output.
pub fn flatten_for_display(nodes: &[CommentNode], max_depth: usize) -> Vec<(usize, &Comment)> {
    fn walk<'a>(
        node: &'a CommentNode,
        depth: usize,
        max_depth: usize,
        out: &mut Vec<(usize, &'a Comment)>,
    ) {
        out.push((depth.min(max_depth), &node.comment));
        for reply in &node.replies {
            walk(reply, depth + 1, max_depth, out);
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        walk(node, 0, max_depth, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>, created_at: i64) -> Comment {
        Comment {
            id: id.to_string(),
            discussion_id: "d1".to_string(),
            course_id: "c1".to_string(),
            parent_id: parent.map(str::to_string),
            content: format!("comment {}", id),
            author_id: "u1".to_string(),
            author_name: "Ada".to_string(),
            author_role: "student".to_string(),
            is_anonymous: false,
            created_at,
        }
    }

    #[test]
    fn test_top_level_sorts_newest_first() {
        let batch = vec![
            comment("a", None, 100),
            comment("b", None, 300),
            comment("c", None, 200),
        ];

        let tree = build_comment_tree(&batch);
        let ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_replies_sort_oldest_first() {
        let batch = vec![
            comment("root", None, 100),
            comment("r2", Some("root"), 300),
            comment("r1", Some("root"), 200),
        ];

        let tree = build_comment_tree(&batch);
        assert_eq!(tree.len(), 1);
        let reply_ids: Vec<&str> = tree[0]
            .replies
            .iter()
            .map(|n| n.comment.id.as_str())
            .collect();
        assert_eq!(reply_ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_orphaned_reply_becomes_top_level() {
        let batch = vec![
            comment("root", None, 100),
            comment("orphan", Some("deleted-parent"), 200),
        ];

        let tree = build_comment_tree(&batch);
        let ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(ids, vec!["orphan", "root"]);
    }

    #[test]
    fn test_self_referencing_comment_is_not_dropped() {
        let batch = vec![comment("loop", Some("loop"), 100)];

        let tree = build_comment_tree(&batch);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, "loop");
    }

    #[test]
    fn test_nested_replies_attach_recursively() {
        let batch = vec![
            comment("root", None, 100),
            comment("child", Some("root"), 200),
            comment("grandchild", Some("child"), 300),
        ];

        let tree = build_comment_tree(&batch);
        assert_eq!(tree[0].len(), 3);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, "grandchild");
    }

    #[test]
    fn test_created_at_ties_break_on_id() {
        let batch = vec![
            comment("b", None, 100),
            comment("a", None, 100),
        ];

        let tree = build_comment_tree(&batch);
        let ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_flatten_caps_depth_without_dropping() {
        let batch = vec![
            comment("root", None, 100),
            comment("child", Some("root"), 200),
            comment("grandchild", Some("child"), 300),
            comment("greatgrandchild", Some("grandchild"), 400),
        ];

        let tree = build_comment_tree(&batch);
        let flat = flatten_for_display(&tree, 2);

        assert_eq!(flat.len(), 4);
        let depths: Vec<usize> = flat.iter().map(|(depth, _)| *depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2]);
    }
}
