//! Rate limiting middleware
//!
//! Per-IP token buckets via tower-governor:
//! - credential endpoints (register, login, refresh): 5 burst, 1/s refill
//! - general API: 20 burst, one token per 45s, which bounds a quiet client
//!   to roughly 20 requests per 15 minutes

use governor::{clock::QuantaInstant, middleware::NoOpMiddleware};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::SmartIpKeyExtractor,
};

type RateLimitConfig = GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>>;

/// Limits for register/login/refresh endpoints
pub fn credential_rate_limit_config() -> Arc<RateLimitConfig> {
    Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("Failed to build credential rate limit config"),
    )
}

/// Limits for the rest of the API surface
pub fn api_rate_limit_config() -> Arc<RateLimitConfig> {
    Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(45))
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("Failed to build API rate limit config"),
    )
}

pub use tower_governor::GovernorLayer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_configs_creation() {
        let _credential = credential_rate_limit_config();
        let _api = api_rate_limit_config();
    }
}
