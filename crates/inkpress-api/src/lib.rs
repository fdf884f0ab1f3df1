//! Inkpress API server
//!
//! Multi-tenant blogging backend: account registration and JWT sessions,
//! blog posts with image uploads, and per-post comments. MongoDB holds the
//! documents, Redis caches session projections, and images live in external
//! object storage.

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::register,
        handlers::users::login,
        handlers::users::refresh_token,
        handlers::users::check_email,
        handlers::users::logout,
        handlers::users::current_user,
        handlers::users::update_profile,
        handlers::users::change_avatar,
        handlers::users::change_password,
        handlers::blogs::create_blog,
        handlers::blogs::list_blogs,
        handlers::blogs::get_blog,
        handlers::blogs::update_blog,
        handlers::blogs::delete_blog,
        handlers::comments::create_comment,
        handlers::comments::list_comments,
        handlers::comments::update_comment,
        handlers::comments::delete_comment,
        handlers::health::health,
        handlers::health::ready,
        handlers::health::metrics,
    ),
    components(schemas(
        error::ErrorBody,
        handlers::users::LoginRequest,
        handlers::users::RefreshRequest,
        handlers::users::CheckEmailRequest,
        handlers::users::UpdateProfileRequest,
        handlers::users::ChangePasswordRequest,
        handlers::comments::CreateCommentRequest,
        handlers::comments::UpdateCommentRequest,
        handlers::health::HealthResponse,
        handlers::health::ReadyResponse,
        handlers::health::MetricsResponse,
    )),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "blogs", description = "Blog posts"),
        (name = "comments", description = "Comments"),
        (name = "ops", description = "Health and metrics"),
    ),
    info(
        title = "Inkpress API",
        description = "Multi-tenant blogging backend",
    )
)]
pub struct ApiDoc;

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.increment_request_count();
    next.run(request).await
}

/// Assemble the full application router
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let origin: HeaderValue = state
        .config
        .server
        .cors_origin
        .parse()
        .context("invalid CORS origin")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true);

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
        .with_state(state);

    Ok(router)
}
