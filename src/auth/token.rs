use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{Error, Result};
use crate::types::Token;

const ARGON2_MEMORY: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "hearth";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;

/// A freshly minted token. `raw` is shown to the caller once and never stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub token: Token,
}

pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Mints a `hearth_<lookup>_<secret>` token and the record to store for it.
    /// Admin tokens carry no user.
    pub fn issue(
        &self,
        user_id: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedToken> {
        let lookup = generate_lookup();
        let raw = format!("{TOKEN_PREFIX}_{lookup}_{}", generate_secret());
        let token = Token {
            id: uuid::Uuid::new_v4().to_string(),
            token_hash: self.hash(&raw)?,
            token_lookup: lookup,
            is_admin: user_id.is_none(),
            user_id: user_id.map(str::to_string),
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };
        Ok(IssuedToken { raw, token })
    }

    pub fn hash(&self, token: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash token: {e}")))?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(token.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify token: {e}"))),
        }
    }
}

fn generate_lookup() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..LOOKUP_LENGTH].to_string()
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Splits a raw token into its lookup and secret parts.
pub fn parse_token(token: &str) -> Result<(&str, &str)> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;
    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;

    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH || secret.contains('_') {
        return Err(Error::InvalidTokenFormat);
    }
    Ok((lookup, secret))
}

/// Whether a string has the shape of a hearth token.
#[must_use]
pub fn looks_like_token(token: &str) -> bool {
    parse_token(token).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_format() {
        let generator = TokenGenerator::new();
        let issued = generator.issue(Some("user-1"), None).unwrap();

        let (lookup, secret) = parse_token(&issued.raw).unwrap();
        assert!(issued.raw.starts_with("hearth_"));
        assert_eq!(lookup, issued.token.token_lookup);
        assert_eq!(secret.len(), 24);
        assert!(!issued.token.is_admin);
        assert_eq!(issued.token.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_admin_token_has_no_user() {
        let issued = TokenGenerator::new().issue(None, None).unwrap();
        assert!(issued.token.is_admin);
        assert!(issued.token.user_id.is_none());
    }

    #[test]
    fn test_verification() {
        let generator = TokenGenerator::new();
        let issued = generator.issue(None, None).unwrap();

        assert!(generator.verify(&issued.raw, &issued.token.token_hash).unwrap());
        let tampered = format!("{}x", &issued.raw[..issued.raw.len() - 1]);
        assert!(!generator.verify(&tampered, &issued.token.token_hash).unwrap());
        assert!(issued.token.token_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_parse_token_rejects_bad_shapes() {
        assert!(parse_token("hearth_12345678_abcdefghijklmnopqrstuvwx").is_ok());
        assert!(parse_token("cutlass_12345678_abcdefghijklmnopqrstuvwx").is_err());
        assert!(parse_token("hearth_12345678").is_err());
        assert!(parse_token("hearth_1234_abcdefghijklmnopqrstuvwx").is_err());
        assert!(!looks_like_token("hearth_12345678_abcdefghijk_mnopqrstuvwx"));
    }
}
