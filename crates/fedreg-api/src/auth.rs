//! Bearer token authentication
//!
//! Tokens are HS256 JWTs verified against `auth.jwt_secret`. Reads accept
//! anonymous callers (public projection); writes need a valid token whose
//! subject is an administrator. Without a secret every caller is an
//! administrator.

use crate::error::ApiError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use fedreg_config::AuthConfig;
use fedreg_core::{Error, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const TOKEN_PREFIX: &str = "Bearer ";

/// Claims read from the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: usize,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Identity of the caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Token subject, `None` for anonymous callers or when auth is disabled
    pub subject: Option<String>,
    /// Whether the caller may see private attributes
    pub authenticated: bool,
    /// Whether the caller may write
    pub admin: bool,
}

impl Caller {
    fn anonymous() -> Self {
        Self {
            subject: None,
            authenticated: false,
            admin: false,
        }
    }

    fn unrestricted() -> Self {
        Self {
            subject: None,
            authenticated: true,
            admin: true,
        }
    }

    /// Fail unless the caller may write
    pub fn require_admin(&self) -> Result<()> {
        if !self.authenticated {
            return Err(Error::Unauthorized("missing bearer token".to_string()));
        }
        if !self.admin {
            return Err(Error::Forbidden(format!(
                "'{}' is not allowed to modify the registry",
                self.subject.as_deref().unwrap_or_default()
            )));
        }
        Ok(())
    }
}

/// Verifies bearer tokens
#[derive(Clone)]
pub struct Authenticator {
    decoding_key: Option<Arc<DecodingKey>>,
    validation: Validation,
    config: Arc<AuthConfig>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("enabled", &self.decoding_key.is_some())
            .field("admin_subjects", &self.config.admin_subjects)
            .finish()
    }
}

impl Authenticator {
    /// Build from the auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: config
                .jwt_secret
                .as_ref()
                .map(|secret| Arc::new(DecodingKey::from_secret(secret.as_bytes()))),
            validation: Validation::new(Algorithm::HS256),
            config: Arc::new(config.clone()),
        }
    }

    /// Whether tokens are verified
    pub fn enabled(&self) -> bool {
        self.decoding_key.is_some()
    }

    /// Decode and verify a token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let Some(key) = &self.decoding_key else {
            return Err(Error::Unauthorized("authentication is disabled".to_string()));
        };
        decode::<Claims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "Token validation failed");
                Error::Unauthorized(format!("invalid token: {e}"))
            })
    }

    /// Identify the caller from the `Authorization` header
    pub fn identify(&self, headers: &HeaderMap) -> Result<Caller> {
        if !self.enabled() {
            return Ok(Caller::unrestricted());
        }

        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Caller::anonymous());
        };
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix(TOKEN_PREFIX))
            .ok_or_else(|| Error::Unauthorized("malformed Authorization header".to_string()))?;

        let claims = self.verify(token.trim())?;
        let admin = self.config.is_admin(&claims.sub);
        tracing::debug!(sub = %claims.sub, admin, "Authentication successful");
        Ok(Caller {
            subject: Some(claims.sub),
            authenticated: true,
            admin,
        })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        state.auth.identify(&parts.headers).map_err(ApiError::from)
    }
}

/// Caller allowed to write
#[derive(Debug, Clone)]
pub struct Admin(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if let Err(e) = caller.require_admin() {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Write rejected");
            return Err(e.into());
        }
        Ok(Admin(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config(subjects: &[&str]) -> AuthConfig {
        AuthConfig {
            jwt_secret: Some("s3cret".to_string()),
            admin_subjects: subjects.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn token(secret: &str, sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: 4_102_444_800,
            iat: None,
            iss: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_disabled_auth_is_unrestricted() {
        let auth = Authenticator::new(&AuthConfig::default());
        let caller = auth.identify(&HeaderMap::new()).unwrap();
        assert!(caller.admin);
        assert!(caller.require_admin().is_ok());
    }

    #[test]
    fn test_anonymous_caller() {
        let auth = Authenticator::new(&config(&[]));
        let caller = auth.identify(&HeaderMap::new()).unwrap();
        assert!(!caller.authenticated);
        assert!(matches!(caller.require_admin(), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_valid_token_and_admin_subjects() {
        let auth = Authenticator::new(&config(&["alice"]));

        let alice = auth.identify(&bearer(&token("s3cret", "alice"))).unwrap();
        assert_eq!(alice.subject.as_deref(), Some("alice"));
        assert!(alice.require_admin().is_ok());

        let bob = auth.identify(&bearer(&token("s3cret", "bob"))).unwrap();
        assert!(bob.authenticated);
        assert!(matches!(bob.require_admin(), Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = Authenticator::new(&config(&[]));
        let result = auth.identify(&bearer(&token("other", "alice")));
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }
}
