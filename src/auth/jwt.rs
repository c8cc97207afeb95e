//! JWT Token Handler
//! Mission: Issue and verify signed, time-bounded access and refresh tokens

use crate::auth::models::{Claims, Role, TokenPair};
use crate::config::{AuthConfig, TokenSettings};
use crate::error::AuthFailure;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::time::Duration;
use tracing::debug;

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is malformed or its signature does not match")]
    Invalid,
}

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthFailure::Expired,
            TokenError::Invalid => AuthFailure::Invalid,
        }
    }
}

/// Signing material for one token kind
struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    fn new(settings: &TokenSettings) -> Self {
        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            ttl: settings.ttl,
        }
    }

    fn sign(&self, subject: &str, role: Role) -> Result<String> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| anyhow!("token lifetime of {}s is out of range", self.ttl.as_secs()))?;
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to generate JWT")
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?
            .claims;

        // The library still accepts exp == now.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// JWT Handler for token operations
pub struct JwtHandler {
    access: TokenKeys,
    refresh: TokenKeys,
}

impl JwtHandler {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: TokenKeys::new(&config.access),
            refresh: TokenKeys::new(&config.refresh),
        }
    }

    /// Sign an access and a refresh token for the same subject.
    pub fn issue(&self, subject: &str, role: Role) -> Result<TokenPair> {
        debug!(
            "Generating tokens for user {}, access expires in {}s",
            subject,
            self.access.ttl.as_secs()
        );

        Ok(TokenPair {
            access_token: self.access.sign(subject, role)?,
            refresh_token: self.refresh.sign(subject, role)?,
        })
    }

    /// Verify a bearer token against the access secret.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.access.verify(token)
    }

    /// Verify a token against the refresh secret.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.refresh.verify(token)
    }
}
