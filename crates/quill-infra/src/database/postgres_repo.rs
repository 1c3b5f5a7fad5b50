//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use quill_core::domain::{
    CommentWithAuthor, Page, PageMeta, PostQuery, PostWithAuthor,
};
use quill_core::error::RepoError;
use quill_core::ports::{CommentRepository, PostRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

const PUBLISHED: &str = "published";

/// Case-insensitive substring match on a post column.
fn contains_ci(column: post::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

/// Exact token membership over the comma-delimited tag column.
///
/// A tag matches when it is the whole stored value or sits at a comma
/// boundary, so "art" does not match a stored "party".
fn tag_matches(tag: &str) -> Condition {
    Condition::any()
        .add(post::Column::Tags.eq(tag))
        .add(post::Column::Tags.like(format!("{tag},%")))
        .add(post::Column::Tags.like(format!("%,{tag}")))
        .add(post::Column::Tags.like(format!("%,{tag},%")))
}

fn published_filter(query: &PostQuery) -> Condition {
    let mut cond = Condition::all().add(post::Column::Status.eq(PUBLISHED));

    if let Some(search) = query.search.as_deref() {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(post::Column::Title, search))
                .add(contains_ci(post::Column::Content, search)),
        );
    }
    if let Some(tag) = query.tag.as_deref() {
        cond = cond.add(tag_matches(tag));
    }

    cond
}

fn zip_author(
    rows: Vec<(post::Model, Option<user::Model>)>,
) -> Result<Vec<PostWithAuthor>, RepoError> {
    rows.into_iter()
        .map(|(post, author)| {
            let author = author
                .ok_or_else(|| RepoError::Query("post row is missing its author".to_string()))?;
            Ok(PostWithAuthor {
                post: post.into(),
                author: author.into(),
            })
        })
        .collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<quill_core::domain::User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = match email.find('@') {
            Some(at_pos) => {
                let (local, domain) = email.split_at(at_pos);
                if local.len() > 1 {
                    format!("{}***{}", &local[..1], domain)
                } else {
                    format!("***{domain}")
                }
            }
            None => "***".to_string(),
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<quill_core::domain::User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_published(&self, query: &PostQuery) -> Result<Page<PostWithAuthor>, RepoError> {
        let filter = published_filter(query);

        let total = PostEntity::find()
            .filter(filter.clone())
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(filter)
            .order_by_desc(post::Column::PublishedAt)
            .order_by_desc(post::Column::CreatedAt)
            .offset(query.offset())
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: zip_author(rows)?,
            meta: PageMeta::new(query.page, query.limit, total),
        })
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(PUBLISHED))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(zip_author(row.into_iter().collect())?.pop())
    }

    async fn find_published_by_author(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Status.eq(PUBLISHED))
            .order_by_desc(post::Column::PublishedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        zip_author(rows)
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        // Store-side atomic add; concurrent requests must not lose updates.
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_approved_thread(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let top_level = CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::IsApproved.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let parent_ids: Vec<Uuid> = top_level.iter().map(|(c, _)| c.id).collect();
        let replies = if parent_ids.is_empty() {
            Vec::new()
        } else {
            CommentEntity::find()
                .find_also_related(UserEntity)
                .filter(comment::Column::ParentId.is_in(parent_ids))
                .filter(comment::Column::IsApproved.eq(true))
                .order_by_asc(comment::Column::CreatedAt)
                .all(&self.db)
                .await
                .map_err(map_db_err)?
        };

        top_level
            .into_iter()
            .chain(replies)
            .map(|(comment, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query("comment row is missing its author".to_string())
                })?;
                Ok(CommentWithAuthor {
                    comment: comment.into(),
                    author: author.into(),
                })
            })
            .collect()
    }
}
