//! Blog post endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inkpress_core::{MediaAsset, Post, SessionUser};

use crate::{
    db::{parse_object_id, PageWindow},
    error::AppError,
    response::ApiResponse,
    state::AppState,
};

// ============================================================================
// DTOs
// ============================================================================

/// Outward post projection with hex ids and RFC 3339 timestamps
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaAsset>,
    pub author: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_hex(),
            title: post.title.clone(),
            content: post.content.clone(),
            image: post.image.clone(),
            author: post.author.to_hex(),
            tags: post.tags.clone(),
            created_at: post.created_at.to_chrono(),
            updated_at: post.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListData {
    pub blogs: Vec<PostView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ============================================================================
// Tags
// ============================================================================

/// Split a comma-separated tag string, trimming entries and dropping blanks
///
/// Every surviving tag must start with `#`.
pub fn parse_tags(raw: &str) -> Result<Vec<String>, AppError> {
    let tags: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    for tag in &tags {
        if !tag.starts_with('#') {
            return Err(AppError::InvalidInput(
                "Every Tag Must Start With #".to_string(),
            ));
        }
    }
    Ok(tags)
}

// ============================================================================
// Handlers
// ============================================================================

struct BlogForm {
    title: Option<String>,
    content: Option<String>,
    tags: Option<String>,
    image: Option<(Vec<u8>, String)>,
}

async fn read_blog_form(mut multipart: Multipart) -> Result<BlogForm, AppError> {
    let mut form = BlogForm {
        title: None,
        content: None,
        tags: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid Multipart Body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("title") => form.title = Some(read_text(field).await?),
            Some("content") => form.content = Some(read_text(field).await?),
            Some("tags") => form.tags = Some(read_text(field).await?),
            Some("image") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid Image Upload: {e}")))?;
                if !bytes.is_empty() {
                    form.image = Some((bytes.to_vec(), filename));
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid Multipart Field: {e}")))
}

/// Create a blog post
///
/// Multipart form: `title`, `content`, optional comma-separated `tags`,
/// optional `image`.
#[utoipa::path(
    post,
    path = "/api/v1/blogs",
    tag = "blogs",
    responses(
        (status = 201, description = "Post created"),
        (status = 400, description = "Missing field or bad tag", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    )
)]
pub async fn create_blog(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<ApiResponse<PostView>, AppError> {
    let form = read_blog_form(multipart).await?;

    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Title Is Required".to_string()))?;
    let content = form
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Content Is Required".to_string()))?;
    let tags = parse_tags(
        form.tags
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("Tags Are Required".to_string()))?,
    )?;
    if tags.is_empty() {
        return Err(AppError::InvalidInput("Tags Are Required".to_string()));
    }

    let image = match form.image {
        Some((bytes, filename)) => Some(state.media.upload(bytes, &filename).await?),
        None => None,
    };

    let author = parse_object_id(&user.id, "Account")?;
    let post = Post::new(title.trim(), content.trim(), author, tags, image);
    state.db.insert_post(&post).await?;

    tracing::info!(post_id = %post.id, author = %user.id, "blog created");
    Ok(ApiResponse::created(
        PostView::from(&post),
        "Blog Created Successfully",
    ))
}

/// Newest-first page of posts
#[utoipa::path(
    get,
    path = "/api/v1/blogs",
    tag = "blogs",
    params(
        ("page" = Option<u64>, Query, description = "1-based page, default 1"),
        ("limit" = Option<u64>, Query, description = "Page size, default 10"),
    ),
    responses((status = 200, description = "Page of posts")),
)]
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<BlogListData>, AppError> {
    let window = PageWindow::new(query.page, query.limit);
    let (posts, total) = state.db.list_posts(window).await?;

    let data = BlogListData {
        blogs: posts.iter().map(PostView::from).collect(),
        total,
        page: window.page,
        limit: window.limit,
    };
    Ok(ApiResponse::ok(data, "Blogs Fetched Successfully"))
}

/// A single post by id
#[utoipa::path(
    get,
    path = "/api/v1/blogs/{id}",
    tag = "blogs",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post"),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    )
)]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<PostView>, AppError> {
    let id = parse_object_id(&id, "Blog")?;
    let post = state
        .db
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;
    Ok(ApiResponse::ok(
        PostView::from(&post),
        "Blog Fetched Successfully",
    ))
}

/// Update a post the caller owns
///
/// Multipart form; any of `title`, `content`, `tags`, `image` may appear.
/// A new image replaces and destroys the old stored asset.
#[utoipa::path(
    put,
    path = "/api/v1/blogs/{id}",
    tag = "blogs",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Updated post"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    )
)]
pub async fn update_blog(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<ApiResponse<PostView>, AppError> {
    let id = parse_object_id(&id, "Blog")?;
    let existing = state
        .db
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;

    if existing.author.to_hex() != user.id {
        return Err(AppError::Forbidden(
            "You Are Not Allowed To Update This Blog".to_string(),
        ));
    }

    let form = read_blog_form(multipart).await?;

    let mut set = bson::doc! {};
    if let Some(title) = form.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        set.insert("title", title);
    }
    if let Some(content) = form
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        set.insert("content", content);
    }
    if let Some(raw) = form.tags.as_deref() {
        set.insert("tags", parse_tags(raw)?);
    }

    let new_image = match form.image {
        Some((bytes, filename)) => {
            let asset = state.media.upload(bytes, &filename).await?;
            set.insert(
                "image",
                bson::to_bson(&asset)
                    .map_err(|e| AppError::Internal(format!("image serialization failed: {e}")))?,
            );
            Some(asset)
        }
        None => None,
    };

    if set.is_empty() {
        return Err(AppError::InvalidInput("Nothing To Update".to_string()));
    }

    let updated = state
        .db
        .update_post(id, set)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;

    // Replaced image is destroyed only after the new reference is durable
    if new_image.is_some() {
        if let Some(old) = existing.image {
            state.media.destroy(&old.public_id).await;
        }
    }

    Ok(ApiResponse::ok(
        PostView::from(&updated),
        "Blog Updated Successfully",
    ))
}

/// Delete a post the caller owns along with its comments and stored image
#[utoipa::path(
    delete,
    path = "/api/v1/blogs/{id}",
    tag = "blogs",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Caller is not the author", body = crate::error::ErrorBody),
        (status = 404, description = "No such post", body = crate::error::ErrorBody),
    )
)]
pub async fn delete_blog(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id = parse_object_id(&id, "Blog")?;
    let post = state
        .db
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog Not Found".to_string()))?;

    if post.author.to_hex() != user.id {
        return Err(AppError::Forbidden(
            "You Are Not Allowed To Delete This Blog".to_string(),
        ));
    }

    // Stored image gets exactly one best-effort remote delete before the
    // row goes away
    if let Some(image) = &post.image {
        state.media.destroy(&image.public_id).await;
    }
    state.db.delete_post(id).await?;
    let removed = state.db.delete_comments_for_post(id).await?;

    tracing::info!(post_id = %id, comments_removed = removed, "blog deleted");
    Ok(ApiResponse::ok((), "Blog Deleted Successfully"))
}
