mod helpers;
mod middleware;
mod token;

pub use helpers::{TokenValidationError, extract_bearer, validate_token};
pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use token::{IssuedToken, TokenGenerator, looks_like_token, parse_token};
