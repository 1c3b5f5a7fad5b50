use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, CommentWithAuthor, Page, Post, PostQuery, PostWithAuthor, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Update an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository - published-only read paths carry the author along.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Page of published posts matching the query, newest first.
    async fn find_published(&self, query: &PostQuery) -> Result<Page<PostWithAuthor>, RepoError>;

    /// A single published post. Drafts and archived posts are invisible here.
    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;

    /// Published posts by one author, newest first.
    async fn find_published_by_author(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// Atomically add 1 to a post's view counter, store-side.
    ///
    /// Implementations must not read-modify-write at the application layer;
    /// N concurrent calls must add exactly N.
    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Approved comments for a post - top level and direct replies - as a
    /// flat list ordered by creation time, each with its author. Tree
    /// assembly happens in the domain layer.
    async fn find_approved_thread(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError>;
}
