//! Inkpress configuration management
//!
//! Handles configuration from environment variables and optional TOML files
//! with sensible defaults for development. Secrets (token signing keys,
//! object-storage credentials) should always come from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// MongoDB connection
    pub database: DatabaseConfig,

    /// Redis session cache
    pub cache: CacheConfig,

    /// JWT secrets and lifetimes
    pub tokens: TokenConfig,

    /// Object-storage (media relay) credentials
    pub media: MediaConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port,
            })?;
        }
        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            config.server.cors_origin = origin;
        }

        // MongoDB
        if let Ok(uri) = std::env::var("MONGO_URI") {
            config.database.uri = uri;
        }
        if let Ok(name) = std::env::var("MONGO_DB") {
            config.database.database = name;
        }

        // Redis
        if let Ok(url) = std::env::var("REDIS_URL") {
            config.cache.url = url;
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            config.cache.session_ttl_secs =
                ttl.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "SESSION_TTL_SECS".to_string(),
                    value: ttl,
                })?;
        }

        // Tokens
        if let Ok(secret) = std::env::var("ACCESS_TOKEN_SECRET") {
            config.tokens.access_secret = secret;
        }
        if let Ok(secret) = std::env::var("REFRESH_TOKEN_SECRET") {
            config.tokens.refresh_secret = secret;
        }
        if let Ok(expiry) = std::env::var("ACCESS_TOKEN_EXPIRY_SECS") {
            config.tokens.access_expiry_secs =
                expiry.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ACCESS_TOKEN_EXPIRY_SECS".to_string(),
                    value: expiry,
                })?;
        }
        if let Ok(expiry) = std::env::var("REFRESH_TOKEN_EXPIRY_SECS") {
            config.tokens.refresh_expiry_secs =
                expiry.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "REFRESH_TOKEN_EXPIRY_SECS".to_string(),
                    value: expiry,
                })?;
        }

        // Object storage
        if let Ok(cloud) = std::env::var("MEDIA_CLOUD_NAME") {
            config.media.cloud_name = cloud;
        }
        if let Ok(key) = std::env::var("MEDIA_API_KEY") {
            config.media.api_key = key;
        }
        if let Ok(secret) = std::env::var("MEDIA_API_SECRET") {
            config.media.api_secret = secret;
        }
        if let Ok(url) = std::env::var("MEDIA_BASE_URL") {
            config.media.base_url = url;
        }
        if let Ok(url) = std::env::var("AVATAR_SERVICE_URL") {
            config.media.avatar_service_url = url;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origin (single origin, credentials enabled)
    pub cors_origin: String,

    /// Maximum request body size in bytes (bounds multipart uploads)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origin: "http://localhost:3000".to_string(),
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// MongoDB connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string
    pub uri: String,

    /// Database name
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "inkpress".to_string(),
        }
    }
}

/// Redis session cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Connection string
    pub url: String,

    /// TTL applied to every session projection write
    pub session_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            session_ttl_secs: 3600,
        }
    }
}

/// JWT signing configuration
///
/// Access and refresh tokens use independent secrets and lifetimes so a
/// leaked access secret does not extend session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// HMAC secret for access tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    pub access_expiry_secs: u64,

    /// Refresh token lifetime in seconds
    pub refresh_expiry_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: "dev-access-secret-change-in-production".to_string(),
            refresh_secret: "dev-refresh-secret-change-in-production".to_string(),
            access_expiry_secs: 3600,          // 1 hour
            refresh_expiry_secs: 10 * 86_400,  // 10 days
        }
    }
}

/// Object-storage (media relay) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Storage account / cloud name, part of the upload URL
    pub cloud_name: String,

    /// API key sent with every signed request
    pub api_key: String,

    /// API secret used for request signing (never sent on the wire)
    pub api_secret: String,

    /// Storage API base URL
    pub base_url: String,

    /// Initials-avatar generation service used when registration supplies
    /// no avatar image
    pub avatar_service_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: "inkpress-dev".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
            avatar_service_url: "https://ui-avatars.com/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.session_ttl_secs, 3600);
        assert_eq!(config.tokens.access_expiry_secs, 3600);
        assert!(config.tokens.access_secret != config.tokens.refresh_secret);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            cors_origin = "https://blog.example.com"
            max_body_size = 1048576

            [database]
            uri = "mongodb://db:27017"
            database = "blog"

            [cache]
            url = "redis://cache:6379"
            session_ttl_secs = 600

            [tokens]
            access_secret = "a"
            refresh_secret = "r"
            access_expiry_secs = 900
            refresh_expiry_secs = 86400

            [media]
            cloud_name = "blog"
            api_key = "key"
            api_secret = "secret"
            base_url = "https://storage.example.com/v1"
            avatar_service_url = "https://avatars.example.com"
            timeout_secs = 10

            [logging]
            level = "debug"
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.database, "blog");
        assert_eq!(config.cache.session_ttl_secs, 600);
        assert_eq!(config.tokens.access_expiry_secs, 900);
        assert_eq!(config.media.cloud_name, "blog");
    }
}
