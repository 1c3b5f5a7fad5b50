//! Post handlers: listing, retrieval, create/update/delete, per-author listing.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges, PostStatus};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    CreatePostRequest, ListPostsQuery, PaginationDto, PostData, PostListData, PostsData,
    UpdatePostRequest,
};

use crate::handlers::{acting_user, post_dto};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::validation;

fn duplicate_slug(err: RepoError) -> AppError {
    match err {
        RepoError::Constraint(_) => {
            AppError::Conflict("A post with this slug already exists".to_string())
        }
        other => other.into(),
    }
}

/// GET /api/posts - published posts with pagination, search, and tag filter.
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = validation::validate_list_query(&query).map_err(AppError::Validation)?;

    let page = state.posts.find_published(&query).await?;
    let posts = page
        .items
        .into_iter()
        .map(|row| post_dto(row.post, &row.author, false))
        .collect();
    let meta = page.meta;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostListData {
        posts,
        pagination: PaginationDto {
            current_page: meta.current_page,
            total_pages: meta.total_pages,
            total_posts: meta.total_posts,
            has_next: meta.has_next,
            has_prev: meta.has_prev,
        },
    })))
}

/// GET /api/posts/{id} - single published post; counts the view.
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let mut row = state
        .posts
        .find_published_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // Unconditional counter; the response reflects this view.
    state.posts.increment_view_count(id).await?;
    row.post.view_count += 1;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostData {
        post: post_dto(row.post, &row.author, true),
    })))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validation::validate_create_post(&req).map_err(AppError::Validation)?;

    let author = acting_user(&state, &identity).await?;
    let status = req
        .status
        .as_deref()
        .and_then(PostStatus::parse)
        .unwrap_or(PostStatus::Draft);

    let post = Post::new(
        author.id,
        req.title,
        req.content,
        req.excerpt,
        req.tags.unwrap_or_default(),
        status,
    );
    let saved = state.posts.insert(post).await.map_err(duplicate_slug)?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        PostData {
            post: post_dto(saved, &author, false),
        },
        "Post created successfully",
    )))
}

/// PUT /api/posts/{id} - author only, partial update.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    validation::validate_update_post(&req).map_err(AppError::Validation)?;

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // Check if user is the author
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this post".to_string(),
        ));
    }

    let author = acting_user(&state, &identity).await?;

    post.apply_update(PostChanges {
        title: req.title,
        content: req.content,
        excerpt: req.excerpt,
        tags: req.tags,
        status: req.status.as_deref().and_then(PostStatus::parse),
    });
    let saved = state.posts.update(post).await.map_err(duplicate_slug)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        PostData {
            post: post_dto(saved, &author, false),
        },
        "Post updated successfully",
    )))
}

/// DELETE /api/posts/{id} - author only; comments go with the post.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // Check if user is the author
    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this post".to_string(),
        ));
    }

    state.posts.delete(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("Post deleted successfully")))
}

/// GET /api/posts/user/{user_id} - published posts by one author, newest first.
pub async fn by_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let rows = state
        .posts
        .find_published_by_author(path.into_inner())
        .await?;

    let posts = rows
        .into_iter()
        .map(|row| post_dto(row.post, &row.author, false))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostsData { posts })))
}
