use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Comment entity - attached to a post, optionally replying to another comment.
///
/// The schema allows arbitrary nesting depth through `parent_id`; retrieval
/// materializes two levels only (top-level plus direct replies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub is_approved: bool,
    pub parent_id: Option<Uuid>,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment. Approved by default - there is no moderation queue.
    pub fn new(content: String, post_id: Uuid, parent_id: Option<Uuid>, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content,
            is_approved: true,
            parent_id,
            post_id,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment paired with its author identity.
#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: User,
}

/// A top-level comment with its direct replies.
#[derive(Debug, Clone)]
pub struct CommentThreadEntry {
    pub comment: Comment,
    pub author: User,
    pub replies: Vec<CommentWithAuthor>,
}

/// Assemble a two-level comment tree from a flat fetch.
///
/// Comments without a parent become top-level entries; the rest are grouped
/// under their parent id. Both levels are ordered by creation time ascending.
/// Replies whose parent is itself a reply are stored but not surfaced.
pub fn assemble_thread(rows: Vec<CommentWithAuthor>) -> Vec<CommentThreadEntry> {
    let (top_level, replies): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|row| row.comment.parent_id.is_none());

    let mut by_parent: HashMap<Uuid, Vec<CommentWithAuthor>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.comment.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    let mut thread: Vec<CommentThreadEntry> = top_level
        .into_iter()
        .map(|row| {
            let mut replies = by_parent.remove(&row.comment.id).unwrap_or_default();
            replies.sort_by_key(|r| r.comment.created_at);
            CommentThreadEntry {
                comment: row.comment,
                author: row.author,
                replies,
            }
        })
        .collect();
    thread.sort_by_key(|entry| entry.comment.created_at);
    thread
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn author(username: &str) -> User {
        User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "hash".to_string(),
        )
    }

    fn at(comment: Comment, offset_secs: i64) -> Comment {
        let base: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().expect("valid timestamp");
        Comment {
            created_at: base + TimeDelta::seconds(offset_secs),
            ..comment
        }
    }

    #[test]
    fn thread_groups_replies_under_parents_in_creation_order() {
        let post_id = Uuid::new_v4();
        let alice = author("alice");
        let bob = author("bob");

        let c1 = at(
            Comment::new("first".to_string(), post_id, None, alice.id),
            10,
        );
        let c2 = at(
            Comment::new("second".to_string(), post_id, None, bob.id),
            20,
        );
        let r1 = at(
            Comment::new("reply".to_string(), post_id, Some(c1.id), bob.id),
            15,
        );

        // Deliberately shuffled input.
        let rows = vec![
            CommentWithAuthor {
                comment: c2.clone(),
                author: bob.clone(),
            },
            CommentWithAuthor {
                comment: r1.clone(),
                author: bob.clone(),
            },
            CommentWithAuthor {
                comment: c1.clone(),
                author: alice.clone(),
            },
        ];

        let thread = assemble_thread(rows);

        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].comment.id, c1.id);
        assert_eq!(thread[0].replies.len(), 1);
        assert_eq!(thread[0].replies[0].comment.id, r1.id);
        assert_eq!(thread[1].comment.id, c2.id);
        assert!(thread[1].replies.is_empty());
    }

    #[test]
    fn replies_to_replies_are_not_surfaced() {
        let post_id = Uuid::new_v4();
        let alice = author("alice");

        let top = at(Comment::new("top".to_string(), post_id, None, alice.id), 0);
        let reply = at(
            Comment::new("reply".to_string(), post_id, Some(top.id), alice.id),
            1,
        );
        let nested = at(
            Comment::new("nested".to_string(), post_id, Some(reply.id), alice.id),
            2,
        );

        let thread = assemble_thread(
            [top.clone(), reply.clone(), nested]
                .into_iter()
                .map(|comment| CommentWithAuthor {
                    comment,
                    author: alice.clone(),
                })
                .collect(),
        );

        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].replies.len(), 1);
        assert_eq!(thread[0].replies[0].comment.id, reply.id);
    }

    #[test]
    fn empty_input_yields_empty_thread() {
        assert!(assemble_thread(vec![]).is_empty());
    }
}
