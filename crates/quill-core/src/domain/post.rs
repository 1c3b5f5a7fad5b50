use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

/// Derive a URL-safe slug from a post title.
///
/// Lower-cases the title, collapses every maximal run of characters outside
/// `[a-z0-9]` into a single hyphen, and strips leading/trailing hyphens.
/// Idempotent: applying it to its own output is a no-op.
pub fn derive_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Derive an excerpt: the first 200 characters of content followed by `...`.
pub fn derive_excerpt(content: &str) -> String {
    let preview: String = content.chars().take(200).collect();
    format!("{preview}...")
}

/// Encode a tag list for storage as a comma-delimited string.
///
/// The inverse of [`decode_tags`]; an empty list is stored as NULL.
pub fn encode_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

/// Decode a stored comma-delimited tag string into an ordered tag list.
pub fn decode_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Post entity - a blog post with derived slug/excerpt and a view counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: String,
    pub status: PostStatus,
    /// Set exactly once, on the first transition into `Published`.
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post paired with its author, as returned by listing queries.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: User,
}

/// Partial update to a post; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl Post {
    /// Create a new post, deriving the slug and excerpt when not supplied.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        excerpt: Option<String>,
        tags: Vec<String>,
        status: PostStatus,
    ) -> Self {
        let now = Utc::now();
        let slug = derive_slug(&title);
        let excerpt = excerpt.or_else(|| {
            if content.is_empty() {
                None
            } else {
                Some(derive_excerpt(&content))
            }
        });
        let published_at = (status == PostStatus::Published).then_some(now);

        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            excerpt,
            slug,
            status,
            published_at,
            tags,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update.
    ///
    /// A changed title re-derives the slug (no explicit slug accompanies the
    /// API update). A changed content derives the excerpt only when none
    /// exists after the explicit fields are applied; an existing excerpt is
    /// never overwritten, even when stale. `published_at` is set on the first
    /// transition into `Published` and never touched again.
    pub fn apply_update(&mut self, changes: PostChanges) {
        let now = Utc::now();

        if let Some(excerpt) = changes.excerpt {
            self.excerpt = Some(excerpt);
        }

        if let Some(title) = changes.title {
            if title != self.title {
                self.slug = derive_slug(&title);
            }
            self.title = title;
        }

        if let Some(content) = changes.content {
            let changed = content != self.content;
            self.content = content;
            if changed && self.excerpt.is_none() {
                self.excerpt = Some(derive_excerpt(&self.content));
            }
        }

        if let Some(tags) = changes.tags {
            self.tags = tags;
        }

        if let Some(status) = changes.status {
            self.status = status;
            if status == PostStatus::Published && self.published_at.is_none() {
                self.published_at = Some(now);
            }
        }

        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed(slug: &str) -> bool {
        // ^[a-z0-9]+(-[a-z0-9]+)*$ or empty
        !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn slug_collapses_punctuation_runs() {
        assert_eq!(derive_slug("Hello, World!"), "hello-world");
        assert_eq!(derive_slug("  Rust 2024 -- edition  "), "rust-2024-edition");
        assert_eq!(derive_slug("???"), "");
    }

    #[test]
    fn slug_is_idempotent() {
        for title in ["Hello, World!", "a--b", "Déjà vu", "100% coverage"] {
            let once = derive_slug(title);
            assert_eq!(derive_slug(&once), once);
        }
    }

    #[test]
    fn slug_matches_expected_shape() {
        for title in ["Hello, World!", "-lead", "trail-", "", "çédille", "A  B"] {
            assert!(well_formed(&derive_slug(title)));
        }
    }

    #[test]
    fn excerpt_takes_first_200_chars() {
        let content = "x".repeat(300);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.len(), 203);
        assert!(excerpt.ends_with("..."));

        assert_eq!(derive_excerpt("short"), "short...");
    }

    #[test]
    fn tags_round_trip_through_codec() {
        let tags = vec!["rust".to_string(), "web".to_string()];
        let encoded = encode_tags(&tags);
        assert_eq!(encoded.as_deref(), Some("rust,web"));
        assert_eq!(decode_tags(encoded.as_deref()), tags);

        assert_eq!(encode_tags(&[]), None);
        assert!(decode_tags(None).is_empty());
    }

    #[test]
    fn new_post_derives_slug_and_excerpt() {
        let post = Post::new(
            Uuid::new_v4(),
            "My First Post!".to_string(),
            "Some long enough content".to_string(),
            None,
            vec![],
            PostStatus::Draft,
        );

        assert_eq!(post.slug, "my-first-post");
        assert_eq!(post.excerpt.as_deref(), Some("Some long enough content..."));
        assert!(post.published_at.is_none());
        assert_eq!(post.view_count, 0);
    }

    #[test]
    fn explicit_excerpt_is_kept() {
        let post = Post::new(
            Uuid::new_v4(),
            "Title here".to_string(),
            "Body text that is long enough".to_string(),
            Some("hand-written".to_string()),
            vec![],
            PostStatus::Draft,
        );
        assert_eq!(post.excerpt.as_deref(), Some("hand-written"));
    }

    #[test]
    fn publishing_at_creation_stamps_published_at() {
        let post = Post::new(
            Uuid::new_v4(),
            "Title here".to_string(),
            "Body text that is long enough".to_string(),
            None,
            vec![],
            PostStatus::Published,
        );
        assert!(post.published_at.is_some());
    }

    #[test]
    fn published_at_is_set_once_and_never_recomputed() {
        let mut post = Post::new(
            Uuid::new_v4(),
            "Title here".to_string(),
            "Body text that is long enough".to_string(),
            None,
            vec![],
            PostStatus::Draft,
        );
        assert!(post.published_at.is_none());

        post.apply_update(PostChanges {
            status: Some(PostStatus::Published),
            ..Default::default()
        });
        let first = post.published_at.expect("set on first publish");

        post.apply_update(PostChanges {
            status: Some(PostStatus::Published),
            ..Default::default()
        });
        assert_eq!(post.published_at, Some(first));

        // Archive and re-publish: the original timestamp survives.
        post.apply_update(PostChanges {
            status: Some(PostStatus::Archived),
            ..Default::default()
        });
        post.apply_update(PostChanges {
            status: Some(PostStatus::Published),
            ..Default::default()
        });
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn title_change_rederives_slug() {
        let mut post = Post::new(
            Uuid::new_v4(),
            "Original Title".to_string(),
            "Body text that is long enough".to_string(),
            None,
            vec![],
            PostStatus::Draft,
        );
        post.apply_update(PostChanges {
            title: Some("Renamed Title".to_string()),
            ..Default::default()
        });
        assert_eq!(post.slug, "renamed-title");
    }

    #[test]
    fn content_change_never_overwrites_existing_excerpt() {
        let mut post = Post::new(
            Uuid::new_v4(),
            "Title here".to_string(),
            "Body text that is long enough".to_string(),
            Some("keep me".to_string()),
            vec![],
            PostStatus::Draft,
        );
        post.apply_update(PostChanges {
            content: Some("Entirely different body text".to_string()),
            ..Default::default()
        });
        assert_eq!(post.excerpt.as_deref(), Some("keep me"));
    }
}
