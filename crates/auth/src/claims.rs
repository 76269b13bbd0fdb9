use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use bazaar_core::{Clock, UserId};

use crate::{Principal, Role};

/// Token claims model (transport-agnostic).
///
/// This is the minimal set of claims the services expect once a token has
/// been decoded/verified by whatever security layer is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / principal identifier.
    pub sub: UserId,

    pub email: String,

    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        Principal::new(self.sub, self.email, self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token could not be decoded: {0}")]
    Malformed(String),
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding is
/// the job of a [`TokenDecoder`].
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Opaque token verification (signature checking lives behind this trait).
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Claims, TokenValidationError>;
}

/// Resolves a credential to the acting principal.
///
/// `None` means the caller is unauthenticated; it is never an error.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> Option<Principal>;
}

#[async_trait]
impl<R> IdentityResolver for Arc<R>
where
    R: IdentityResolver + ?Sized,
{
    async fn resolve(&self, credential: &str) -> Option<Principal> {
        (**self).resolve(credential).await
    }
}

/// Resolver backed by a [`TokenDecoder`] plus claim time-window validation.
pub struct ClaimsIdentityResolver<D, C> {
    decoder: D,
    clock: C,
}

impl<D, C> ClaimsIdentityResolver<D, C> {
    pub fn new(decoder: D, clock: C) -> Self {
        Self { decoder, clock }
    }
}

#[async_trait]
impl<D, C> IdentityResolver for ClaimsIdentityResolver<D, C>
where
    D: TokenDecoder,
    C: Clock,
{
    async fn resolve(&self, credential: &str) -> Option<Principal> {
        let token = credential
            .strip_prefix("Bearer ")
            .unwrap_or(credential)
            .trim();
        if token.is_empty() {
            return None;
        }

        let claims = match self.decoder.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token rejected");
                return None;
            }
        };

        if let Err(e) = validate_claims(&claims, self.clock.now()) {
            debug!(error = %e, sub = %claims.sub, "claims rejected");
            return None;
        }

        Some(claims.into_principal())
    }
}

/// Fixed token → principal map, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    principals: HashMap<String, Principal>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(token.into(), principal);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, credential: &str) -> Option<Principal> {
        self.principals.get(credential).cloned()
    }
}
