//! Account endpoints: registration, sessions, and profile management

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidateEmail;

use inkpress_core::{MediaAsset, SessionUser};

use crate::{
    auth::{service::TokenPair, AuthService, ACCESS_COOKIE, REFRESH_COOKIE},
    error::AppError,
    response::ApiResponse,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailData {
    pub exists: bool,
}

// ============================================================================
// Helpers
// ============================================================================

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

fn set_session_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access.clone()))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh.clone()))
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if !email.validate_email() {
        return Err(AppError::InvalidInput("Invalid Email Address".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(
            "Password Must Be At Least 6 Characters".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account and open its first session
///
/// Multipart form: `name`, `email`, `password`, optional `avatar` image.
/// Without an avatar the account gets a generated-initials image.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "users",
    responses(
        (status = 201, description = "Account created, session issued"),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<(CookieJar, ApiResponse<SessionData>), AppError> {
    let mut name = None;
    let mut email = None;
    let mut password = None;
    let mut avatar_part: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid Multipart Body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = Some(read_text(field).await?),
            Some("email") => email = Some(read_text(field).await?),
            Some("password") => password = Some(read_text(field).await?),
            Some("avatar") => {
                let filename = field.file_name().unwrap_or("avatar").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid Avatar Upload: {e}")))?;
                avatar_part = Some((bytes.to_vec(), filename));
            }
            _ => {}
        }
    }

    let name = require(name, "Name")?;
    let email = require(email, "Email")?;
    let password = require(password, "Password")?;
    validate_email(&email)?;
    validate_password(&password)?;

    let avatar: Option<MediaAsset> = match avatar_part {
        Some((bytes, filename)) if !bytes.is_empty() => {
            Some(state.media.upload(bytes, &filename).await?)
        }
        _ => None,
    };

    let (user, pair) = AuthService::new(&state)
        .register(&name, &email, &password, avatar)
        .await?;

    tracing::info!(user_id = %user.id, "account registered");
    let jar = set_session_cookies(jar, &pair);
    let data = SessionData {
        user,
        access_token: pair.access,
        refresh_token: pair.refresh,
    };
    Ok((jar, ApiResponse::created(data, "User Registered Successfully")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid Multipart Field: {e}")))
}

fn require(value: Option<String>, what: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(AppError::InvalidInput(format!("{what} Is Required"))),
    }
}

/// Log in with email and password
///
/// Issues an access/refresh pair, sets both as httpOnly cookies, and also
/// returns them in the body for non-browser clients.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued"),
        (status = 401, description = "Wrong password", body = crate::error::ErrorBody),
        (status = 404, description = "No account for email", body = crate::error::ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionData>), AppError> {
    validate_email(&request.email)?;
    if request.password.is_empty() {
        return Err(AppError::InvalidInput("Password Is Required".to_string()));
    }

    let (user, pair) = AuthService::new(&state)
        .login(&request.email, &request.password)
        .await?;

    let jar = set_session_cookies(jar, &pair);
    let data = SessionData {
        user,
        access_token: pair.access,
        refresh_token: pair.refresh,
    };
    Ok((jar, ApiResponse::ok(data, "User Logged In Successfully")))
}

/// Rotate the refresh token
///
/// The token is taken from the `refreshToken` cookie, falling back to the
/// request body. A token that does not match the one stored on the account
/// is treated as already used.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    tag = "users",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New pair issued"),
        (status = 401, description = "Missing, invalid, or replayed token", body = crate::error::ErrorBody),
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<SessionData>), AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(r)| r.refresh_token))
        .ok_or_else(|| AppError::Unauthenticated("Unauthorized Request".to_string()))?;

    let (user, pair) = AuthService::new(&state).refresh(&token).await?;

    let jar = set_session_cookies(jar, &pair);
    let data = SessionData {
        user,
        access_token: pair.access,
        refresh_token: pair.refresh,
    };
    Ok((jar, ApiResponse::ok(data, "Access Token Refreshed Successfully")))
}

/// Availability probe used by registration forms
#[utoipa::path(
    post,
    path = "/api/v1/users/check-email",
    tag = "users",
    request_body = CheckEmailRequest,
    responses((status = 200, description = "Probe result")),
)]
pub async fn check_email(
    State(state): State<AppState>,
    Json(request): Json<CheckEmailRequest>,
) -> Result<ApiResponse<CheckEmailData>, AppError> {
    validate_email(&request.email)?;
    let exists = state.db.email_exists(&request.email).await?;
    Ok(ApiResponse::ok(
        CheckEmailData { exists },
        "Email Checked Successfully",
    ))
}

/// End the session: clear the stored refresh token, drop the cached
/// session, and expire both cookies
#[utoipa::path(
    get,
    path = "/api/v1/users/logout",
    tag = "users",
    responses(
        (status = 200, description = "Session ended"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(user): Extension<SessionUser>,
) -> Result<(CookieJar, ApiResponse<()>), AppError> {
    AuthService::new(&state).logout(&user).await?;

    let jar = jar
        .remove(expired_cookie(ACCESS_COOKIE))
        .remove(expired_cookie(REFRESH_COOKIE));
    Ok((jar, ApiResponse::ok((), "User Logged Out Successfully")))
}

/// The caller's own session projection
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Current account"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    )
)]
pub async fn current_user(
    Extension(user): Extension<SessionUser>,
) -> ApiResponse<SessionUser> {
    ApiResponse::ok(user, "Current User Fetched Successfully")
}

/// Update name and/or email
#[utoipa::path(
    put,
    path = "/api/v1/users",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Nothing to update or invalid email", body = crate::error::ErrorBody),
        (status = 409, description = "Email taken", body = crate::error::ErrorBody),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<SessionUser>, AppError> {
    if let Some(email) = request.email.as_deref() {
        validate_email(email)?;
    }
    let updated = AuthService::new(&state)
        .update_profile(&user, request.name.as_deref(), request.email.as_deref())
        .await?;
    Ok(ApiResponse::ok(updated, "Account Details Updated Successfully"))
}

/// Replace the avatar image
///
/// Multipart form with a single `avatar` file. The previous stored asset is
/// destroyed after the swap.
#[utoipa::path(
    put,
    path = "/api/v1/users/change-avatar",
    tag = "users",
    responses(
        (status = 200, description = "Avatar replaced"),
        (status = 400, description = "No avatar file in body", body = crate::error::ErrorBody),
    )
)]
pub async fn change_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<ApiResponse<SessionUser>, AppError> {
    let mut avatar_part: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid Multipart Body: {e}")))?
    {
        if field.name() == Some("avatar") {
            let filename = field.file_name().unwrap_or("avatar").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Invalid Avatar Upload: {e}")))?;
            avatar_part = Some((bytes.to_vec(), filename));
        }
    }

    let (bytes, filename) = avatar_part
        .filter(|(bytes, _)| !bytes.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Avatar File Is Required".to_string()))?;

    let updated = AuthService::new(&state)
        .change_avatar(&user, bytes, &filename)
        .await?;
    Ok(ApiResponse::ok(updated, "Avatar Updated Successfully"))
}

/// Change the password after verifying the old one
#[utoipa::path(
    put,
    path = "/api/v1/users/change-password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Old password wrong", body = crate::error::ErrorBody),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    validate_password(&request.new_password)?;
    AuthService::new(&state)
        .change_password(&user, &request.old_password, &request.new_password)
        .await?;
    Ok(ApiResponse::ok((), "Password Changed Successfully"))
}
