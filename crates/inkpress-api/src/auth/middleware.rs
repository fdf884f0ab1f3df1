//! Authentication gate
//!
//! Protected routes run behind [`auth_gate`]: resolve the access token
//! (cookie first, then bearer header), verify it, then attach the session
//! projection from the cache, falling back to the document store on a miss.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use inkpress_core::SessionUser;

use crate::{db::parse_object_id, error::AppError, state::AppState};

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Access token from the cookie, falling back to the `Authorization` header
fn extract_access_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Resolve the caller's identity or reject with 401
pub async fn auth_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_access_token(&jar, &request)
        .ok_or_else(|| AppError::Unauthenticated("Unauthorized Request".to_string()))?;

    let claims = state.tokens.verify_access(&token).map_err(|e| {
        tracing::debug!(error = %e, "access token rejected");
        AppError::Unauthenticated("Invalid Access Token".to_string())
    })?;

    let user = resolve_session(&state, &claims.sub).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Cache-first identity lookup; a store miss means the account is gone
async fn resolve_session(state: &AppState, account_id: &str) -> Result<SessionUser, AppError> {
    // Cache errors degrade to a database load
    match state.cache.get(account_id).await {
        Ok(Some(user)) => return Ok(user),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(account_id, error = %e, "session cache unavailable");
        }
    }

    let id = parse_object_id(account_id, "Account")
        .map_err(|_| AppError::Unauthenticated("Invalid Access Token".to_string()))?;
    let account = state
        .db
        .find_account_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User Not Found".to_string()))?;

    let user = SessionUser::from(&account);
    if let Err(e) = state.cache.put(&user).await {
        tracing::warn!(account_id, error = %e, "failed to warm session cache");
    }
    Ok(user)
}
