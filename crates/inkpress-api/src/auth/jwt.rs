//! JWT issuance and verification
//!
//! Two independent token families signed with HS256:
//! - access tokens carry identity claims and gate every protected route
//! - refresh tokens carry only the subject and are stored server-side so a
//!   rotation invalidates every previously issued refresh token

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkpress_core::{Role, SessionUser, TokenConfig};

/// Claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: account id (hex)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Unique token id
    pub jti: String,
    /// Issued at (unix seconds)
    pub iat: u64,
    /// Expiration (unix seconds)
    pub exp: u64,
}

/// Claims embedded in a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject: account id (hex)
    pub sub: String,
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

/// Token verification errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Invalid(err.to_string()),
    }
}

/// Signs and verifies both token families
#[derive(Clone)]
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_secs: u64,
    refresh_expiry_secs: u64,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expiry_secs: config.access_expiry_secs,
            refresh_expiry_secs: config.refresh_expiry_secs,
        }
    }

    /// Access token lifetime, exposed for cookie max-age
    pub fn access_expiry_secs(&self) -> u64 {
        self.access_expiry_secs
    }

    /// Refresh token lifetime, exposed for cookie max-age
    pub fn refresh_expiry_secs(&self) -> u64 {
        self.refresh_expiry_secs
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    /// Issue a short-lived access token carrying the session identity
    pub fn issue_access(&self, user: &SessionUser) -> Result<String, TokenError> {
        let now = Self::now();
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.access_expiry_secs,
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue a long-lived refresh token carrying only the subject
    pub fn issue_refresh(&self, account_id: &str) -> Result<String, TokenError> {
        let now = Self::now();
        let claims = RefreshClaims {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.refresh_expiry_secs,
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpress_core::MediaAsset;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            access_expiry_secs: 3600,
            refresh_expiry_secs: 86_400,
        })
    }

    fn user() -> SessionUser {
        SessionUser {
            id: "64f000000000000000000001".to_string(),
            name: "Ann Lee".to_string(),
            username: "annlee1234".to_string(),
            email: "ann@x.com".to_string(),
            role: Role::Regular,
            avatar: MediaAsset {
                url: "https://cdn.example.com/a.png".to_string(),
                public_id: "avatars/a".to_string(),
            },
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = issuer();
        let token = issuer.issue_access(&user()).unwrap();
        let claims = issuer.verify_access(&token).unwrap();
        assert_eq!(claims.sub, "64f000000000000000000001");
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.role, Role::Regular);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let issuer = issuer();
        let token = issuer.issue_refresh("64f000000000000000000001").unwrap();
        let claims = issuer.verify_refresh(&token).unwrap();
        assert_eq!(claims.sub, "64f000000000000000000001");
    }

    #[test]
    fn test_token_families_are_not_interchangeable() {
        let issuer = issuer();
        let refresh = issuer.issue_refresh("64f000000000000000000001").unwrap();
        // A refresh token must not pass the access verifier
        assert!(issuer.verify_access(&refresh).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new(&TokenConfig {
            access_secret: "a-different-secret".to_string(),
            refresh_secret: "another-different-secret".to_string(),
            access_expiry_secs: 3600,
            refresh_expiry_secs: 86_400,
        });
        let token = issuer.issue_access(&user()).unwrap();
        assert!(matches!(
            other.verify_access(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let now = TokenIssuer::now();
        let claims = AccessClaims {
            sub: "64f000000000000000000001".to_string(),
            email: "ann@x.com".to_string(),
            name: "Ann Lee".to_string(),
            role: Role::Regular,
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &issuer.access_encoding).unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = issuer();
        assert!(issuer.verify_access("not.a.jwt").is_err());
    }
}
