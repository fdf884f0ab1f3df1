//! Cross-cutting request middleware

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{api_rate_limit_config, credential_rate_limit_config, GovernorLayer};
pub use security_headers::security_headers_middleware;
