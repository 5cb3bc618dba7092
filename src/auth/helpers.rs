use chrono::Utc;

use super::{TokenGenerator, parse_token};
use crate::store::Store;
use crate::types::Token;

#[derive(Debug, PartialEq, Eq)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

/// Pulls the raw token out of an `Authorization: Bearer ...` header.
/// `Ok(None)` means no header was sent.
pub fn extract_bearer(header: Option<&str>) -> Result<Option<&str>, TokenValidationError> {
    match header {
        None => Ok(None),
        Some(value) => value
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim()))
            .ok_or(TokenValidationError::InvalidScheme),
    }
}

/// Checks a raw token against its stored hash and expiry, then stamps
/// `last_used_at`.
pub fn validate_token(store: &dyn Store, raw_token: &str) -> Result<Token, TokenValidationError> {
    let (lookup, _) = parse_token(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = store
        .get_token_by_lookup(lookup)
        .map_err(|e| {
            tracing::error!("Token lookup failed: {e}");
            TokenValidationError::InternalError
        })?
        .ok_or(TokenValidationError::InvalidToken)?;

    let verified = TokenGenerator::new()
        .verify(raw_token, &token.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?;
    if !verified {
        return Err(TokenValidationError::InvalidToken);
    }

    if token.expires_at.is_some_and(|expires| expires < Utc::now()) {
        return Err(TokenValidationError::TokenExpired);
    }

    if let Err(e) = store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(token)
}
