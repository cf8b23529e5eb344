// Authentication: password hashing, JWT sessions, request extractors,
// rate limiting and the auth endpoints.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod rate_limit;
pub mod reset;
pub mod token;
pub mod validation;

pub use extractor::{AdminUser, AuthUser};
