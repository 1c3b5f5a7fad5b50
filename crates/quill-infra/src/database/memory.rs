//! In-memory repositories - used when no database is configured and by tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Comment, CommentWithAuthor, Page, PageMeta, Post, PostQuery, PostStatus, PostWithAuthor, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

const DUPLICATE: &str = "duplicate value for a unique field";

/// In-memory store backing all three repository ports.
///
/// Query behavior mirrors the PostgreSQL repositories, including the
/// cascade-delete of a post's comments and of a comment's reply subtree.
/// Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryBlogStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn attach_author(users: &HashMap<Uuid, User>, post: &Post) -> Result<PostWithAuthor, RepoError> {
    let author = users
        .get(&post.author_id)
        .cloned()
        .ok_or_else(|| RepoError::Query("post row is missing its author".to_string()))?;
    Ok(PostWithAuthor {
        post: post.clone(),
        author,
    })
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|u| u.username == entity.username || u.email == entity.email);
        if taken {
            return Err(RepoError::Constraint(DUPLICATE.to_string()));
        }
        users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // Lock order everywhere: posts, comments, users.
        let mut posts = self.posts.write().await;
        let mut comments = self.comments.write().await;
        let mut users = self.users.write().await;
        if users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        // Cascade, as the foreign keys would.
        let doomed_posts: HashSet<Uuid> = posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        posts.retain(|_, p| p.author_id != id);
        comments.retain(|_, c| c.user_id != id && !doomed_posts.contains(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryBlogStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.values().any(|p| p.slug == entity.slug) {
            return Err(RepoError::Constraint(DUPLICATE.to_string()));
        }
        posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if !posts.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        if posts
            .values()
            .any(|p| p.id != entity.id && p.slug == entity.slug)
        {
            return Err(RepoError::Constraint(DUPLICATE.to_string()));
        }
        posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        if posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        self.comments.write().await.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn find_published(&self, query: &PostQuery) -> Result<Page<PostWithAuthor>, RepoError> {
        let posts = self.posts.read().await;
        let users = self.users.read().await;

        let mut matches: Vec<&Post> = posts
            .values()
            .filter(|p| p.status == PostStatus::Published)
            .filter(|p| match query.search.as_deref() {
                Some(search) => {
                    let needle = search.to_lowercase();
                    p.title.to_lowercase().contains(&needle)
                        || p.content.to_lowercase().contains(&needle)
                }
                None => true,
            })
            .filter(|p| match query.tag.as_deref() {
                Some(tag) => p.tags.iter().any(|t| t == tag),
                None => true,
            })
            .collect();
        matches.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .map(|p| attach_author(&users, p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            meta: PageMeta::new(query.page, query.limit, total),
        })
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let posts = self.posts.read().await;
        let users = self.users.read().await;

        posts
            .get(&id)
            .filter(|p| p.status == PostStatus::Published)
            .map(|p| attach_author(&users, p))
            .transpose()
    }

    async fn find_published_by_author(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let posts = self.posts.read().await;
        let users = self.users.read().await;

        let mut matches: Vec<&Post> = posts
            .values()
            .filter(|p| p.author_id == author_id && p.status == PostStatus::Published)
            .collect();
        matches.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        matches
            .into_iter()
            .map(|p| attach_author(&users, p))
            .collect()
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        // The write lock is this store's atomic-add primitive.
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut comments = self.comments.write().await;
        comments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut comments = self.comments.write().await;
        if !comments.contains_key(&entity.id) {
            return Err(RepoError::NotFound);
        }
        comments.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut comments = self.comments.write().await;
        if comments.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        // Cascade the reply subtree, as the self-referencing FK would.
        let mut frontier = vec![id];
        while let Some(parent) = frontier.pop() {
            let children: Vec<Uuid> = comments
                .values()
                .filter(|c| c.parent_id == Some(parent))
                .map(|c| c.id)
                .collect();
            for child in &children {
                comments.remove(child);
            }
            frontier.extend(children);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn find_approved_thread(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let comments = self.comments.read().await;
        let users = self.users.read().await;

        let mut top_level: Vec<&Comment> = comments
            .values()
            .filter(|c| c.post_id == post_id && c.is_approved && c.parent_id.is_none())
            .collect();
        top_level.sort_by_key(|c| c.created_at);

        let top_ids: HashSet<Uuid> = top_level.iter().map(|c| c.id).collect();
        let mut replies: Vec<&Comment> = comments
            .values()
            .filter(|c| c.is_approved && c.parent_id.is_some_and(|p| top_ids.contains(&p)))
            .collect();
        replies.sort_by_key(|c| c.created_at);

        top_level
            .into_iter()
            .chain(replies)
            .map(|c| {
                let author = users.get(&c.user_id).cloned().ok_or_else(|| {
                    RepoError::Query("comment row is missing its author".to_string())
                })?;
                Ok(CommentWithAuthor {
                    comment: c.clone(),
                    author,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, Utc};
    use futures::future::join_all;

    use super::*;

    fn user(name: &str) -> User {
        User::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
        )
    }

    fn published(author: &User, title: &str, offset_secs: i64) -> Post {
        let mut post = Post::new(
            author.id,
            title.to_string(),
            format!("Content of {title}, long enough to pass validation."),
            None,
            vec![],
            PostStatus::Published,
        );
        let base = Utc::now();
        post.published_at = Some(base + TimeDelta::seconds(offset_secs));
        post.created_at = base + TimeDelta::seconds(offset_secs);
        post
    }

    async fn seed_author(store: &InMemoryBlogStore) -> User {
        store.insert(user("author")).await.unwrap()
    }

    #[tokio::test]
    async fn pagination_splits_twenty_five_posts() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        for i in 0..25 {
            store
                .insert(published(&author, &format!("Post number {i}"), i))
                .await
                .unwrap();
        }

        let first = store
            .find_published(&PostQuery::default())
            .await
            .unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.meta.total_pages, 3);
        assert_eq!(first.meta.total_posts, 25);
        assert!(first.meta.has_next);
        assert!(!first.meta.has_prev);

        let last = store
            .find_published(&PostQuery {
                page: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5);
        assert!(!last.meta.has_next);
        assert!(last.meta.has_prev);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        store.insert(published(&author, "Older", 0)).await.unwrap();
        store.insert(published(&author, "Newer", 60)).await.unwrap();

        let page = store.find_published(&PostQuery::default()).await.unwrap();
        assert_eq!(page.items[0].post.title, "Newer");
        assert_eq!(page.items[1].post.title, "Older");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_and_content() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        store
            .insert(published(&author, "Rust Tips", 0))
            .await
            .unwrap();
        store
            .insert(published(&author, "Gardening", 1))
            .await
            .unwrap();

        for needle in ["rust", "RUST", "Tips"] {
            let page = store
                .find_published(&PostQuery {
                    search: Some(needle.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(page.items.len(), 1, "search {needle:?}");
            assert_eq!(page.items[0].post.title, "Rust Tips");
        }

        // Content is searched too.
        let page = store
            .find_published(&PostQuery {
                search: Some("content of gardening".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn drafts_are_invisible_to_listing_and_single_fetch() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        let mut draft = published(&author, "Hidden draft", 0);
        draft.status = PostStatus::Draft;
        draft.published_at = None;
        let draft = store.insert(draft).await.unwrap();

        let page = store.find_published(&PostQuery::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert!(
            store
                .find_published_by_id(draft.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn tag_filter_is_exact_token_membership() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        let mut post = published(&author, "Celebrations", 0);
        post.tags = vec!["party".to_string(), "food".to_string()];
        store.insert(post).await.unwrap();

        let art = store
            .find_published(&PostQuery {
                tag: Some("art".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(art.items.is_empty(), "\"art\" must not match \"party\"");

        let party = store
            .find_published(&PostQuery {
                tag: Some("party".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(party.items.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_constraint_violation() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        store
            .insert(published(&author, "Same Title", 0))
            .await
            .unwrap();
        let result = store.insert(published(&author, "Same Title", 1)).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_views_are_all_counted() {
        let store = Arc::new(InMemoryBlogStore::new());
        let author = seed_author(&store).await;
        let post = store.insert(published(&author, "Hot take", 0)).await.unwrap();

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = post.id;
                tokio::spawn(async move { store.increment_view_count(id).await })
            })
            .collect();
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let fetched: Option<Post> = store.find_by_id(post.id).await.unwrap();
        assert_eq!(fetched.unwrap().view_count, 25);
    }

    #[tokio::test]
    async fn thread_excludes_unapproved_comments_at_both_levels() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        let post = store
            .insert(published(&author, "Discussed", 0))
            .await
            .unwrap();

        let visible = store
            .insert(Comment::new("fine".to_string(), post.id, None, author.id))
            .await
            .unwrap();
        let mut hidden_top = Comment::new("spam".to_string(), post.id, None, author.id);
        hidden_top.is_approved = false;
        store.insert(hidden_top).await.unwrap();
        let mut hidden_reply =
            Comment::new("more spam".to_string(), post.id, Some(visible.id), author.id);
        hidden_reply.is_approved = false;
        store.insert(hidden_reply).await.unwrap();

        let thread = store.find_approved_thread(post.id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].comment.id, visible.id);
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        let post = store
            .insert(published(&author, "Short lived", 0))
            .await
            .unwrap();
        let comment = store
            .insert(Comment::new("bye".to_string(), post.id, None, author.id))
            .await
            .unwrap();

        BaseRepository::<Post, Uuid>::delete(&store, post.id)
            .await
            .unwrap();
        let gone: Option<Comment> = store.find_by_id(comment.id).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_reply_subtree() {
        let store = InMemoryBlogStore::new();
        let author = seed_author(&store).await;
        let post = store
            .insert(published(&author, "Threaded", 0))
            .await
            .unwrap();

        let top = store
            .insert(Comment::new("top".to_string(), post.id, None, author.id))
            .await
            .unwrap();
        let reply = store
            .insert(Comment::new(
                "reply".to_string(),
                post.id,
                Some(top.id),
                author.id,
            ))
            .await
            .unwrap();
        let nested = store
            .insert(Comment::new(
                "nested".to_string(),
                post.id,
                Some(reply.id),
                author.id,
            ))
            .await
            .unwrap();
        let unrelated = store
            .insert(Comment::new("other".to_string(), post.id, None, author.id))
            .await
            .unwrap();

        BaseRepository::<Comment, Uuid>::delete(&store, top.id)
            .await
            .unwrap();

        for id in [top.id, reply.id, nested.id] {
            let gone: Option<Comment> = store.find_by_id(id).await.unwrap();
            assert!(gone.is_none());
        }
        let kept: Option<Comment> = store.find_by_id(unrelated.id).await.unwrap();
        assert!(kept.is_some());
    }
}
