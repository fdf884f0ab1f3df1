//! Comment endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use inkpress_core::{Comment, SessionUser};

use crate::{
    db::{parse_object_id, PageWindow},
    error::AppError,
    response::ApiResponse,
    state::AppState,
};

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub blog_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub blog_id: String,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author: String,
    pub blog: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.to_hex(),
            content: comment.content.clone(),
            author: comment.author.to_hex(),
            blog: comment.post.to_hex(),
            created_at: comment.created_at.to_chrono(),
            updated_at: comment.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListData {
    pub comments: Vec<CommentView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

fn require_content(content: &str) -> Result<&str, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Content Is Required".to_string()));
    }
    Ok(trimmed)
}

// ============================================================================
// Handlers
// ============================================================================

/// Comment on a post
#[utoipa::path(
    post,
    path = "/api/v1/comments",
    tag = "comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created"),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<ApiResponse<CommentView>, AppError> {
    let content = require_content(&request.content)?;
    let blog_id = parse_object_id(&request.blog_id, "Blog")?;

    state
        .db
        .find_post(blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;

    let author = parse_object_id(&user.id, "Account")?;
    let comment = Comment::new(content, author, blog_id);
    state.db.insert_comment(&comment).await?;

    Ok(ApiResponse::created(
        CommentView::from(&comment),
        "Comment Created Successfully",
    ))
}

/// Newest-first page of a post's comments
#[utoipa::path(
    get,
    path = "/api/v1/comments",
    tag = "comments",
    params(
        ("blogId" = String, Query, description = "Post id"),
        ("page" = Option<u64>, Query, description = "1-based page, default 1"),
        ("limit" = Option<u64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Page of comments"),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> Result<ApiResponse<CommentListData>, AppError> {
    let blog_id = parse_object_id(&query.blog_id, "Blog")?;
    state
        .db
        .find_post(blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;

    let window = PageWindow::new(query.page, query.limit);
    let (comments, total) = state.db.list_comments(blog_id, window).await?;

    let data = CommentListData {
        comments: comments.iter().map(CommentView::from).collect(),
        total,
        page: window.page,
        limit: window.limit,
    };
    Ok(ApiResponse::ok(data, "Comments Fetched Successfully"))
}

/// Edit a comment the caller wrote
#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such comment", body = crate::error::ErrorBody),
    )
)]
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<ApiResponse<CommentView>, AppError> {
    let content = require_content(&request.content)?;
    let id = parse_object_id(&id, "Comment")?;

    let existing = state
        .db
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment Not Found".to_string()))?;

    if existing.author.to_hex() != user.id {
        return Err(AppError::Forbidden(
            "You Are Not Allowed To Update This Comment".to_string(),
        ));
    }

    let updated = state
        .db
        .update_comment(id, content)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment Not Found".to_string()))?;

    Ok(ApiResponse::ok(
        CommentView::from(&updated),
        "Comment Updated Successfully",
    ))
}

/// Delete a comment the caller wrote
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such comment", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id = parse_object_id(&id, "Comment")?;

    let existing = state
        .db
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment Not Found".to_string()))?;

    if existing.author.to_hex() != user.id {
        return Err(AppError::Forbidden(
            "You Are Not Allowed To Delete This Comment".to_string(),
        ));
    }

    state.db.delete_comment(id).await?;
    Ok(ApiResponse::ok((), "Comment Deleted Successfully"))
}
