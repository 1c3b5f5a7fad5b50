//! Request validation - field-level rules for every write and query path.
//!
//! Each validator collects every failing field before returning, so the
//! client sees the complete `[{field, message}]` list in one response.

use uuid::Uuid;

use quill_core::domain::{PostQuery, PostStatus};
use quill_shared::FieldError;
use quill_shared::dto::{
    CreateCommentRequest, CreatePostRequest, ListPostsQuery, LoginRequest, RegisterRequest,
    UpdatePostRequest,
};

type Validated<T> = Result<T, Vec<FieldError>>;

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_register(req: &RegisterRequest) -> Validated<()> {
    let mut errors = Vec::new();

    let username_len = char_len(&req.username);
    if !(3..=50).contains(&username_len) {
        errors.push(FieldError::new(
            "username",
            "Username must be between 3 and 50 characters",
        ));
    } else if !req.username.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(FieldError::new(
            "username",
            "Username must contain only letters and numbers",
        ));
    }

    if !is_email(&req.email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }

    if char_len(&req.password) < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    } else {
        let has_lower = req.password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = req.password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = req.password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            errors.push(FieldError::new(
                "password",
                "Password must contain at least one lowercase letter, one uppercase letter, and one number",
            ));
        }
    }

    if req.first_name.as_deref().is_some_and(|v| char_len(v) > 50) {
        errors.push(FieldError::new(
            "firstName",
            "First name must be less than 50 characters",
        ));
    }
    if req.last_name.as_deref().is_some_and(|v| char_len(v) > 50) {
        errors.push(FieldError::new(
            "lastName",
            "Last name must be less than 50 characters",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_login(req: &LoginRequest) -> Validated<()> {
    let mut errors = Vec::new();

    if !is_email(&req.email) {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_title(errors: &mut Vec<FieldError>, title: &str) {
    if !(5..=200).contains(&char_len(title)) {
        errors.push(FieldError::new(
            "title",
            "Title must be between 5 and 200 characters",
        ));
    }
}

fn check_content(errors: &mut Vec<FieldError>, content: &str) {
    let len = char_len(content);
    if len < 10 {
        errors.push(FieldError::new(
            "content",
            "Content must be at least 10 characters long",
        ));
    } else if len > 50_000 {
        errors.push(FieldError::new(
            "content",
            "Content must be less than 50000 characters",
        ));
    }
}

fn check_excerpt(errors: &mut Vec<FieldError>, excerpt: &str) {
    if char_len(excerpt) > 500 {
        errors.push(FieldError::new(
            "excerpt",
            "Excerpt must be less than 500 characters",
        ));
    }
}

fn check_status(errors: &mut Vec<FieldError>, status: &str, allow_archived: bool) {
    match PostStatus::parse(status) {
        Some(PostStatus::Archived) if !allow_archived => {
            errors.push(FieldError::new(
                "status",
                "Status must be either draft or published",
            ));
        }
        Some(_) => {}
        None => {
            let message = if allow_archived {
                "Status must be draft, published, or archived"
            } else {
                "Status must be either draft or published"
            };
            errors.push(FieldError::new("status", message));
        }
    }
}

pub fn validate_create_post(req: &CreatePostRequest) -> Validated<()> {
    let mut errors = Vec::new();

    check_title(&mut errors, &req.title);
    check_content(&mut errors, &req.content);
    if let Some(excerpt) = req.excerpt.as_deref() {
        check_excerpt(&mut errors, excerpt);
    }
    if let Some(status) = req.status.as_deref() {
        check_status(&mut errors, status, false);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_update_post(req: &UpdatePostRequest) -> Validated<()> {
    let mut errors = Vec::new();

    if let Some(title) = req.title.as_deref() {
        check_title(&mut errors, title);
    }
    if let Some(content) = req.content.as_deref() {
        check_content(&mut errors, content);
    }
    if let Some(excerpt) = req.excerpt.as_deref() {
        check_excerpt(&mut errors, excerpt);
    }
    if let Some(status) = req.status.as_deref() {
        check_status(&mut errors, status, true);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validate and resolve the listing query string into typed parameters.
pub fn validate_list_query(raw: &ListPostsQuery) -> Validated<PostQuery> {
    let mut errors = Vec::new();
    let mut query = PostQuery::default();

    if let Some(page) = raw.page.as_deref() {
        match page.parse::<u64>() {
            Ok(page) if page >= 1 => query.page = page,
            _ => errors.push(FieldError::new("page", "Page must be a positive integer")),
        }
    }
    if let Some(limit) = raw.limit.as_deref() {
        match limit.parse::<u64>() {
            Ok(limit) if (1..=100).contains(&limit) => query.limit = limit,
            _ => errors.push(FieldError::new("limit", "Limit must be between 1 and 100")),
        }
    }
    if let Some(search) = raw.search.as_deref() {
        if search.is_empty() {
            errors.push(FieldError::new("search", "Search term must not be empty"));
        } else {
            query.search = Some(search.to_string());
        }
    }
    if let Some(tag) = raw.tag.as_deref() {
        if tag.is_empty() {
            errors.push(FieldError::new("tag", "Tag must not be empty"));
        } else {
            query.tag = Some(tag.to_string());
        }
    }

    if errors.is_empty() { Ok(query) } else { Err(errors) }
}

pub fn check_comment_content(content: &str) -> Validated<()> {
    if (1..=1000).contains(&char_len(content)) {
        Ok(())
    } else {
        Err(vec![FieldError::new(
            "content",
            "Comment must be between 1 and 1000 characters",
        )])
    }
}

/// Validate a comment creation request, resolving the referenced ids.
pub fn validate_create_comment(req: &CreateCommentRequest) -> Validated<(Uuid, Option<Uuid>)> {
    let mut errors = Vec::new();

    if let Err(mut content_errors) = check_comment_content(&req.content) {
        errors.append(&mut content_errors);
    }

    let post_id = match req.post_id.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(FieldError::new("postId", "Post ID must be a valid id"));
            None
        }
    };

    let parent_id = match req.parent_id.as_deref() {
        Some(raw) => match raw.parse::<Uuid>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(FieldError::new("parentId", "Parent ID must be a valid id"));
                None
            }
        },
        None => None,
    };

    match (errors.is_empty(), post_id) {
        (true, Some(post_id)) => Ok((post_id, parent_id)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "writer1".to_string(),
            email: "writer@example.com".to_string(),
            password: "Passw0rd".to_string(),
            first_name: None,
            last_name: None,
            bio: None,
        }
    }

    #[test]
    fn register_accepts_well_formed_input() {
        assert!(validate_register(&register_request()).is_ok());
    }

    #[test]
    fn register_rejects_weak_password_with_field_detail() {
        let mut req = register_request();
        req.password = "alllowercase".to_string();
        let errors = validate_register(&req).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "password");
    }

    #[test]
    fn register_collects_every_failing_field() {
        let req = RegisterRequest {
            username: "x!".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            first_name: Some("y".repeat(51)),
            last_name: None,
            bio: None,
        };
        let errors = validate_register(&req).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["username", "email", "password", "firstName"]);
    }

    #[test]
    fn create_post_bounds_title_and_content() {
        let req = CreatePostRequest {
            title: "Hi".to_string(),
            content: "short".to_string(),
            excerpt: None,
            tags: None,
            status: None,
        };
        let errors = validate_create_post(&req).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "content"]);
    }

    #[test]
    fn create_post_rejects_archived_status() {
        let req = CreatePostRequest {
            title: "A valid title".to_string(),
            content: "Long enough content".to_string(),
            excerpt: None,
            tags: None,
            status: Some("archived".to_string()),
        };
        let errors = validate_create_post(&req).unwrap_err();
        assert_eq!(errors[0].field, "status");
    }

    #[test]
    fn update_post_admits_archived_status() {
        let req = UpdatePostRequest {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(validate_update_post(&req).is_ok());
    }

    #[test]
    fn list_query_applies_defaults_and_bounds() {
        let query = validate_list_query(&ListPostsQuery::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);

        let raw = ListPostsQuery {
            page: Some("0".to_string()),
            limit: Some("101".to_string()),
            ..Default::default()
        };
        let errors = validate_list_query(&raw).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["page", "limit"]);
    }

    #[test]
    fn comment_create_resolves_ids() {
        let post_id = Uuid::new_v4();
        let req = CreateCommentRequest {
            content: "nice post".to_string(),
            post_id: post_id.to_string(),
            parent_id: None,
        };
        assert_eq!(validate_create_comment(&req).unwrap(), (post_id, None));

        let bad = CreateCommentRequest {
            content: "".to_string(),
            post_id: "not-a-uuid".to_string(),
            parent_id: Some("also bad".to_string()),
        };
        let errors = validate_create_comment(&bad).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["content", "postId", "parentId"]);
    }
}
