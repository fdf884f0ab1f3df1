//! Authentication: token issuance, password hashing, the request gate, and
//! account/session operations.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod username;

pub use jwt::TokenIssuer;
pub use middleware::{auth_gate, ACCESS_COOKIE, REFRESH_COOKIE};
pub use service::AuthService;
