//! Account and session operations
//!
//! Handlers delegate here; the service owns the ordering rules (store write
//! before cache rewrite, refresh rotation before cookie issue) so no handler
//! can get them wrong.

use bson::doc;

use inkpress_core::{Account, MediaAsset, SessionUser};

use crate::{
    auth::{
        jwt::TokenIssuer,
        password::{hash_password, verify_password},
        username::{candidate, MAX_USERNAME_ATTEMPTS},
    },
    cache::SessionCache,
    db::{parse_object_id, Database},
    error::AppError,
    media::MediaRelay,
    state::AppState,
};

/// A freshly issued token pair
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub struct AuthService {
    db: Database,
    cache: SessionCache,
    media: MediaRelay,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            cache: state.cache.clone(),
            media: state.media.clone(),
            tokens: state.tokens.clone(),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Create an account and open its first session
    ///
    /// The username is derived from the name and retried against the unique
    /// index on collision.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        avatar: Option<MediaAsset>,
    ) -> Result<(SessionUser, TokenPair), AppError> {
        if self.db.email_exists(email).await? {
            return Err(AppError::Conflict("Email Already Exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        let avatar = match avatar {
            Some(avatar) => avatar,
            None => self.media.placeholder_avatar(name).await?,
        };

        let mut last_err = None;
        for _ in 0..MAX_USERNAME_ATTEMPTS {
            let account = Account::new(name, candidate(name), email, &password_hash, avatar.clone());
            match self.db.insert_account(&account).await {
                Ok(()) => {
                    let user = SessionUser::from(&account);
                    let pair = self.issue_session(&user).await?;
                    return Ok((user, pair));
                }
                Err(AppError::Conflict(msg)) => {
                    // Either the username suffix collided (retry) or the
                    // email raced in since the pre-check (give up)
                    if self.db.email_exists(email).await? {
                        return Err(AppError::Conflict("Email Already Exists".to_string()));
                    }
                    last_err = Some(AppError::Conflict(msg));
                }
                Err(other) => return Err(other),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            AppError::Internal("Failed To Generate A Unique Username".to_string())
        }))
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Verify credentials, rotate the stored refresh token, and warm the
    /// session cache
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionUser, TokenPair), AppError> {
        let account = self
            .db
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User Not Found".to_string()))?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthenticated("Invalid Credentials".to_string()));
        }

        let user = SessionUser::from(&account);
        let pair = self.issue_session(&user).await?;
        Ok((user, pair))
    }

    /// Exchange a refresh token for a fresh pair
    ///
    /// The presented token must match the single token stored on the
    /// account; anything else is a replay and ends with 401.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(SessionUser, TokenPair), AppError> {
        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            AppError::Unauthenticated("Invalid Refresh Token".to_string())
        })?;

        let id = parse_object_id(&claims.sub, "Account")
            .map_err(|_| AppError::Unauthenticated("Invalid Refresh Token".to_string()))?;
        let account = self
            .db
            .find_account_by_id(id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Invalid Refresh Token".to_string()))?;

        if account.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::Unauthenticated(
                "Refresh Token Is Expired Or Used".to_string(),
            ));
        }

        let user = SessionUser::from(&account);
        let pair = self.issue_session(&user).await?;
        Ok((user, pair))
    }

    /// Clear the stored refresh token and drop the cached session
    pub async fn logout(&self, user: &SessionUser) -> Result<(), AppError> {
        let id = parse_object_id(&user.id, "Account")?;
        self.db.set_refresh_token(id, None).await?;
        self.cache.invalidate(&user.id).await?;
        Ok(())
    }

    async fn issue_session(&self, user: &SessionUser) -> Result<TokenPair, AppError> {
        let access = self.tokens.issue_access(user).map_err(AppError::from)?;
        let refresh = self.tokens.issue_refresh(&user.id).map_err(AppError::from)?;

        let id = parse_object_id(&user.id, "Account")?;
        self.db.set_refresh_token(id, Some(&refresh)).await?;
        self.cache.put(user).await?;

        Ok(TokenPair { access, refresh })
    }

    // ========================================================================
    // Profile
    // ========================================================================

    /// Update name and/or email; the cached session is rewritten afterwards
    pub async fn update_profile(
        &self,
        user: &SessionUser,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<SessionUser, AppError> {
        let mut set = doc! {};
        if let Some(name) = name {
            set.insert("name", name);
        }
        if let Some(email) = email {
            set.insert("email", email.to_lowercase());
        }
        if set.is_empty() {
            return Err(AppError::InvalidInput(
                "Nothing To Update".to_string(),
            ));
        }

        let id = parse_object_id(&user.id, "Account")?;
        let account = self
            .db
            .update_account(id, set)
            .await?
            .ok_or_else(|| AppError::NotFound("User Not Found".to_string()))?;

        let updated = SessionUser::from(&account);
        self.cache.put(&updated).await?;
        Ok(updated)
    }

    /// Upload the new avatar, swap the reference, then destroy the old asset
    pub async fn change_avatar(
        &self,
        user: &SessionUser,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<SessionUser, AppError> {
        let new_avatar = self.media.upload(bytes, filename).await?;

        let id = parse_object_id(&user.id, "Account")?;
        let account = match self.db.set_account_avatar(id, &new_avatar).await? {
            Some(account) => account,
            None => {
                // Account vanished mid-flight; don't orphan the upload
                self.media.destroy(&new_avatar.public_id).await;
                return Err(AppError::NotFound("User Not Found".to_string()));
            }
        };

        // Old asset is removed only after the swap is durable
        self.media.destroy(&user.avatar.public_id).await;

        let updated = SessionUser::from(&account);
        self.cache.put(&updated).await?;
        Ok(updated)
    }

    /// Verify the old password before storing the new hash
    pub async fn change_password(
        &self,
        user: &SessionUser,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let id = parse_object_id(&user.id, "Account")?;
        let account = self
            .db
            .find_account_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User Not Found".to_string()))?;

        if !verify_password(old_password, &account.password_hash)? {
            return Err(AppError::Unauthenticated(
                "Old Password Is Incorrect".to_string(),
            ));
        }

        let hash = hash_password(new_password)?;
        self.db.set_account_password(id, &hash).await?;
        Ok(())
    }
}
