//! API route definitions

use crate::auth::middleware::auth_gate;
use crate::handlers::{blogs, comments, users};
use crate::middleware::{api_rate_limit_config, credential_rate_limit_config, GovernorLayer};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

/// Create API v1 routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    // Credential routes get the strictest per-IP limits
    let credential_routes = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_token))
        .layer(GovernorLayer {
            config: credential_rate_limit_config(),
        });

    let public_routes = Router::new().route("/users/check-email", post(users::check_email));

    // Everything else requires an authenticated session
    let protected_routes = Router::new()
        .route("/users/logout", get(users::logout))
        .route("/users", get(users::current_user))
        .route("/users", put(users::update_profile))
        .route("/users/change-avatar", put(users::change_avatar))
        .route("/users/change-password", put(users::change_password))
        // Blog endpoints
        .route("/blogs", post(blogs::create_blog))
        .route("/blogs", get(blogs::list_blogs))
        .route("/blogs/:id", get(blogs::get_blog))
        .route("/blogs/:id", put(blogs::update_blog))
        .route("/blogs/:id", delete(blogs::delete_blog))
        // Comment endpoints
        .route("/comments", post(comments::create_comment))
        .route("/comments", get(comments::list_comments))
        .route("/comments/:id", put(comments::update_comment))
        .route("/comments/:id", delete(comments::delete_comment))
        .layer(middleware::from_fn_with_state(state, auth_gate));

    Router::new()
        .merge(credential_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(GovernorLayer {
            config: api_rate_limit_config(),
        })
}
