//! MongoDB document store
//!
//! Typed collection access for accounts, posts, and comments. Connection
//! setup pings the server and ensures the unique indexes that back the
//! email/username conflict semantics.

use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

use inkpress_core::{Account, Comment, DatabaseConfig, MediaAsset, Post};

use crate::error::AppError;

/// Largest page size a client may request
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Pagination window computed from `page`/`limit` query parameters
#[derive(Debug, Clone, Copy)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Clamp raw query values: page defaults to 1, limit defaults to 10 and
    /// is capped at [`MAX_PAGE_LIMIT`]
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            limit: limit
                .filter(|l| *l >= 1)
                .unwrap_or(10)
                .min(MAX_PAGE_LIMIT),
        }
    }

    /// Documents to skip; saturates so absurd page numbers cannot overflow
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Handle to the document store with typed collections
#[derive(Clone)]
pub struct Database {
    db: mongodb::Database,
    accounts: Collection<Account>,
    posts: Collection<Post>,
    comments: Collection<Comment>,
}

impl Database {
    /// Connect, ping, and ensure indexes
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| AppError::Database(format!("connection failed: {e}")))?;
        let db = client.database(&config.database);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(format!("ping failed: {e}")))?;

        let store = Self {
            accounts: db.collection("accounts"),
            posts: db.collection("posts"),
            comments: db.collection("comments"),
            db,
        };
        store.ensure_indexes().await?;

        tracing::info!(database = %config.database, "connected to MongoDB");
        Ok(store)
    }

    /// Liveness probe used by the readiness endpoint
    pub async fn ping(&self) -> Result<(), AppError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(format!("ping failed: {e}")))?;
        Ok(())
    }

    /// Unique indexes on email and username back the 409 conflict semantics
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        let unique = IndexOptions::builder().unique(true).build();
        self.accounts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;
        self.accounts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;
        // Comment listing filters by post
        self.comments
            .create_index(IndexModel::builder().keys(doc! { "post": 1 }).build())
            .await?;
        Ok(())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        self.accounts.insert_one(account).await?;
        Ok(())
    }

    pub async fn find_account_by_id(&self, id: ObjectId) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .find_one(doc! { "email": email.to_lowercase() })
            .await?)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let count = self
            .accounts
            .count_documents(doc! { "email": email.to_lowercase() })
            .await?;
        Ok(count > 0)
    }

    /// Replace the account's stored refresh token; `None` ends the session
    pub async fn set_refresh_token(
        &self,
        id: ObjectId,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let value = match token {
            Some(t) => bson::Bson::String(t.to_string()),
            None => bson::Bson::Null,
        };
        self.accounts
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "refresh_token": value, "updated_at": bson::DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    /// Apply a partial profile update and return the updated account
    pub async fn update_account(
        &self,
        id: ObjectId,
        set: Document,
    ) -> Result<Option<Account>, AppError> {
        let mut set = set;
        set.insert("updated_at", bson::DateTime::now());
        Ok(self
            .accounts
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn set_account_avatar(
        &self,
        id: ObjectId,
        avatar: &MediaAsset,
    ) -> Result<Option<Account>, AppError> {
        let avatar = bson::to_bson(avatar)
            .map_err(|e| AppError::Internal(format!("avatar serialization failed: {e}")))?;
        self.update_account(id, doc! { "avatar": avatar }).await
    }

    pub async fn set_account_password(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> Result<(), AppError> {
        self.update_account(id, doc! { "password_hash": password_hash })
            .await?;
        Ok(())
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        self.posts.insert_one(post).await?;
        Ok(())
    }

    pub async fn find_post(&self, id: ObjectId) -> Result<Option<Post>, AppError> {
        Ok(self.posts.find_one(doc! { "_id": id }).await?)
    }

    /// Newest-first page of posts plus the total count
    ///
    /// Page and count are two independent queries; under concurrent writes
    /// the total is approximate, not a snapshot of the returned page.
    pub async fn list_posts(&self, window: PageWindow) -> Result<(Vec<Post>, u64), AppError> {
        let posts: Vec<Post> = self
            .posts
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .skip(window.skip())
            .limit(window.limit as i64)
            .await?
            .try_collect()
            .await?;
        let total = self.posts.count_documents(doc! {}).await?;
        Ok((posts, total))
    }

    /// Apply a partial post update and return the updated document
    pub async fn update_post(
        &self,
        id: ObjectId,
        set: Document,
    ) -> Result<Option<Post>, AppError> {
        let mut set = set;
        set.insert("updated_at", bson::DateTime::now());
        Ok(self
            .posts
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_post(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self.posts.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        self.comments.insert_one(comment).await?;
        Ok(())
    }

    pub async fn find_comment(&self, id: ObjectId) -> Result<Option<Comment>, AppError> {
        Ok(self.comments.find_one(doc! { "_id": id }).await?)
    }

    /// Newest-first page of a post's comments plus the total count
    ///
    /// Same approximate-count caveat as [`Database::list_posts`].
    pub async fn list_comments(
        &self,
        post: ObjectId,
        window: PageWindow,
    ) -> Result<(Vec<Comment>, u64), AppError> {
        let filter = doc! { "post": post };
        let comments: Vec<Comment> = self
            .comments
            .find(filter.clone())
            .sort(doc! { "created_at": -1 })
            .skip(window.skip())
            .limit(window.limit as i64)
            .await?
            .try_collect()
            .await?;
        let total = self.comments.count_documents(filter).await?;
        Ok((comments, total))
    }

    pub async fn update_comment(
        &self,
        id: ObjectId,
        content: &str,
    ) -> Result<Option<Comment>, AppError> {
        Ok(self
            .comments
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updated_at": bson::DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_comment(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self.comments.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Removes every comment attached to a deleted post
    pub async fn delete_comments_for_post(&self, post: ObjectId) -> Result<u64, AppError> {
        let result = self.comments.delete_many(doc! { "post": post }).await?;
        Ok(result.deleted_count)
    }
}

/// Parse a path/query id into an [`ObjectId`], surfacing 400 on garbage
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::InvalidInput(format!("Invalid {what} Id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        let w = PageWindow::new(None, None);
        assert_eq!(w.page, 1);
        assert_eq!(w.limit, 10);
        assert_eq!(w.skip(), 0);
    }

    #[test]
    fn test_page_window_skip() {
        let w = PageWindow::new(Some(3), Some(20));
        assert_eq!(w.skip(), 40);
    }

    #[test]
    fn test_page_window_rejects_zero() {
        let w = PageWindow::new(Some(0), Some(0));
        assert_eq!(w.page, 1);
        assert_eq!(w.limit, 10);
    }

    #[test]
    fn test_page_window_caps_limit() {
        let w = PageWindow::new(Some(1), Some(u64::MAX));
        assert_eq!(w.limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_page_window_huge_page_saturates() {
        // Raw query values must never be able to panic the handler
        let w = PageWindow::new(Some(u64::MAX), Some(10));
        assert_eq!(w.skip(), u64::MAX);
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("64f000000000000000000001", "Blog").is_ok());
        let err = parse_object_id("nope", "Blog").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
