//! Comment handlers: two-level thread retrieval and create/update/delete.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Comment, assemble_thread};
use quill_core::ports::{BaseRepository, CommentRepository};
use quill_shared::ApiResponse;
use quill_shared::dto::{CommentData, CommentsData, CreateCommentRequest, UpdateCommentRequest};

use crate::handlers::{acting_user, comment_dto};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::validation;

/// GET /api/comments/post/{post_id} - approved comments with nested replies.
pub async fn for_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let rows = state.comments.find_approved_thread(post_id).await?;
    let comments = assemble_thread(rows)
        .into_iter()
        .map(|entry| {
            let replies = entry
                .replies
                .into_iter()
                .map(|reply| comment_dto(reply.comment, &reply.author, None))
                .collect();
            comment_dto(entry.comment, &entry.author, Some(replies))
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CommentsData { comments })))
}

/// POST /api/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let (post_id, parent_id) =
        validation::validate_create_comment(&req).map_err(AppError::Validation)?;

    let author = acting_user(&state, &identity).await?;

    // Check if post exists
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // If a parent is given, check that it exists
    if let Some(parent_id) = parent_id {
        state
            .comments
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
    }

    let comment = Comment::new(req.content, post_id, parent_id, identity.user_id);
    let saved = state.comments.insert(comment).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        CommentData {
            comment: comment_dto(saved, &author, None),
        },
        "Comment created successfully",
    )))
}

/// PUT /api/comments/{id} - author only, content only.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    validation::check_comment_content(&req.content).map_err(AppError::Validation)?;

    let mut comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    // Check if user is the author
    if comment.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this comment".to_string(),
        ));
    }

    let author = acting_user(&state, &identity).await?;

    comment.content = req.content;
    comment.updated_at = chrono::Utc::now();
    let saved = state.comments.update(comment).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        CommentData {
            comment: comment_dto(saved, &author, None),
        },
        "Comment updated successfully",
    )))
}

/// DELETE /api/comments/{id} - author only; replies go with the comment.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let comment = state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    // Check if user is the author
    if comment.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this comment".to_string(),
        ));
    }

    state.comments.delete(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("Comment deleted successfully")))
}
