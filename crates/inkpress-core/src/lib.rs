//! Inkpress Core - Domain models and shared types
//!
//! This crate defines the core abstractions used throughout the Inkpress
//! backend:
//! - Persistent entities (accounts, posts, comments)
//! - The cache-resident session projection
//! - Media asset references (object-storage URL + identifier)
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, CacheConfig, ConfigError, DatabaseConfig, MediaConfig, ServerConfig, TokenConfig,
};

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Accounts
// ============================================================================

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Reference to an image held in external object storage
///
/// `public_id` is the storage-side identifier used for deletion and
/// replacement; `url` is the public delivery URL embedded in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
}

/// A registered account as stored in the `accounts` collection
///
/// `password_hash` and `refresh_token` never appear in any outward
/// projection; handlers and the session cache only ever see [`SessionUser`].
/// Email and username are unique across all accounts (enforced by indexes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub username: String,
    /// Stored lowercased so uniqueness is case-insensitive.
    pub email: String,
    pub role: Role,
    pub avatar: MediaAsset,
    pub password_hash: String,
    /// The single live refresh token for this account; `None` means no
    /// active session. Replaced wholesale on every login/refresh.
    pub refresh_token: Option<String>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl Account {
    /// Create a new account record with freshly minted id and timestamps
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        avatar: MediaAsset,
    ) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: ObjectId::new(),
            name: name.into(),
            username: username.into(),
            email: email.into().to_lowercase(),
            role: Role::Regular,
            avatar,
            password_hash: password_hash.into(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Reduced, password-free account projection
///
/// This is what the auth gate attaches to the request context and what the
/// session cache stores (JSON, fixed TTL). It must never grow credential
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: MediaAsset,
}

impl From<&Account> for SessionUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_hex(),
            name: account.name.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            avatar: account.avatar.clone(),
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

/// A blog post as stored in the `posts` collection
///
/// Tags are validated at the handler boundary: every tag starts with `#`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaAsset>,
    pub author: ObjectId,
    pub tags: Vec<String>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl Post {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: ObjectId,
        tags: Vec<String>,
        image: Option<MediaAsset>,
    ) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: ObjectId::new(),
            title: title.into(),
            content: content.into(),
            image,
            author,
            tags,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

/// A comment on a post, stored in the `comments` collection
///
/// Update and deletion are permitted only for the stored author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub author: ObjectId,
    pub post: ObjectId,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl Comment {
    pub fn new(content: impl Into<String>, author: ObjectId, post: ObjectId) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: ObjectId::new(),
            content: content.into(),
            author,
            post,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account() -> Account {
        Account::new(
            "Ann Lee",
            "annlee1234",
            "Ann@X.com",
            "$2b$10$abcdefghijklmnopqrstuv",
            MediaAsset {
                url: "https://cdn.example.com/avatars/a.png".to_string(),
                public_id: "avatars/a".to_string(),
            },
        )
    }

    #[test]
    fn test_new_account_defaults() {
        let account = test_account();
        assert_eq!(account.role, Role::Regular);
        assert!(account.refresh_token.is_none());
        // Emails are normalized for case-insensitive uniqueness
        assert_eq!(account.email, "ann@x.com");
    }

    #[test]
    fn test_session_projection_has_no_credentials() {
        let account = test_account();
        let session = SessionUser::from(&account);

        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("refresh_token"));
        assert!(json.contains(&account.id.to_hex()));
        assert!(json.contains("annlee1234"));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Regular).unwrap(), "\"regular\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_account_bson_round_trip() {
        let account = test_account();
        let doc = bson::to_document(&account).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("password_hash"));

        let back: Account = bson::from_document(doc).unwrap();
        assert_eq!(back.id, account.id);
        assert_eq!(back.email, account.email);
    }

    #[test]
    fn test_post_defaults() {
        let author = ObjectId::new();
        let post = Post::new(
            "Hello",
            "First post",
            author,
            vec!["#intro".to_string()],
            None,
        );
        assert_eq!(post.author, author);
        assert!(post.image.is_none());
        assert_eq!(post.tags, vec!["#intro"]);
    }
}
