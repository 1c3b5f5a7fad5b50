//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;

use actix_web::web;

use quill_core::domain::{Comment, Post, User};
use quill_core::ports::BaseRepository;
use quill_shared::dto::{AuthorDto, CommentDto, PostDto, UserDto};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Post routes ("/user/{user_id}" must precede "/{id}")
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/user/{user_id}", web::get().to(posts::by_user))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            // Comment routes
            .service(
                web::scope("/comments")
                    .route("/post/{post_id}", web::get().to(comments::for_post))
                    .route("", web::post().to(comments::create))
                    .route("/{id}", web::put().to(comments::update))
                    .route("/{id}", web::delete().to(comments::delete)),
            ),
    );
}

/// Resolve the acting user behind a token; a valid token whose user has
/// vanished is treated as unauthenticated.
pub(crate) async fn acting_user(
    state: &crate::state::AppState,
    identity: &crate::middleware::auth::Identity,
) -> Result<User, crate::middleware::error::AppError> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(crate::middleware::error::AppError::Unauthorized)
}

// ─── DTO mapping ────────────────────────────────────────────────────────────

pub(crate) fn user_dto(user: &User) -> UserDto {
    UserDto {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        bio: user.bio.clone(),
        created_at: user.created_at,
    }
}

/// Public author identity. `include_bio` is true on the single-post detail
/// view only.
pub(crate) fn author_dto(user: &User, include_bio: bool) -> AuthorDto {
    AuthorDto {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        bio: if include_bio { user.bio.clone() } else { None },
    }
}

pub(crate) fn post_dto(post: Post, author: &User, include_bio: bool) -> PostDto {
    PostDto {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        content: post.content,
        excerpt: post.excerpt,
        slug: post.slug,
        status: post.status.as_str().to_string(),
        published_at: post.published_at,
        tags: post.tags,
        view_count: post.view_count,
        created_at: post.created_at,
        updated_at: post.updated_at,
        author: author_dto(author, include_bio),
    }
}

pub(crate) fn comment_dto(
    comment: Comment,
    author: &User,
    replies: Option<Vec<CommentDto>>,
) -> CommentDto {
    CommentDto {
        id: comment.id,
        content: comment.content,
        is_approved: comment.is_approved,
        parent_id: comment.parent_id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        author: author_dto(author, false),
        replies,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use quill_core::domain::User;
    use quill_core::ports::{BaseRepository, PasswordService, TokenService};
    use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

    use crate::state::AppState;

    pub fn test_state() -> AppState {
        AppState::in_memory()
    }

    pub fn test_token_service() -> Arc<dyn TokenService> {
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        }))
    }

    pub fn test_password_service() -> Arc<dyn PasswordService> {
        Arc::new(Argon2PasswordService::new())
    }

    pub async fn seed_user(state: &AppState, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "unused-hash".to_string(),
        );
        state.users.insert(user).await.unwrap()
    }

    pub fn bearer(token_service: &Arc<dyn TokenService>, user: &User) -> (&'static str, String) {
        let token = token_service
            .generate_token(user.id, &user.username, &user.email)
            .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }
}
