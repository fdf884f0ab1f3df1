//! Redis session cache
//!
//! Stores the password-free [`SessionUser`] projection as JSON under
//! `session:<account id>`. Every write carries the same fixed TTL, and every
//! account mutation rewrites the entry so the gate never serves stale
//! identity for longer than one TTL window.

use redis::{aio::ConnectionManager, AsyncCommands};

use inkpress_core::{CacheConfig, SessionUser};

use crate::error::AppError;

fn session_key(account_id: &str) -> String {
    format!("session:{account_id}")
}

/// Cache handle; the inner connection manager reconnects on its own
#[derive(Clone)]
pub struct SessionCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl SessionCache {
    pub async fn connect(config: &CacheConfig) -> Result<Self, AppError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(ttl_secs = config.session_ttl_secs, "connected to Redis");
        Ok(Self {
            conn,
            ttl_secs: config.session_ttl_secs,
        })
    }

    /// Cached session projection, or `None` on miss or undecodable entry
    pub async fn get(&self, account_id: &str) -> Result<Option<SessionUser>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(session_key(account_id)).await?;
        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(user) => Ok(Some(user)),
                Err(e) => {
                    // Treat a corrupt entry as a miss so the gate falls back
                    // to the document store
                    tracing::warn!(account_id, error = %e, "dropping undecodable session entry");
                    let _: () = conn.del(session_key(account_id)).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Write the projection with the fixed TTL, replacing any prior entry
    pub async fn put(&self, user: &SessionUser) -> Result<(), AppError> {
        let json = serde_json::to_string(user)
            .map_err(|e| AppError::Internal(format!("session serialization failed: {e}")))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(session_key(&user.id), json, self.ttl_secs).await?;
        Ok(())
    }

    /// Drop the entry, typically on logout
    pub async fn invalidate(&self, account_id: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(account_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_format() {
        assert_eq!(
            session_key("64f000000000000000000001"),
            "session:64f000000000000000000001"
        );
    }
}
