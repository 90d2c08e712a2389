//! # JWT Token Management
//!
//! Bearer tokens are validated statelessly: the claims carry everything the
//! request pipeline needs to know about the caller.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::user::Credentials;
use crate::request::AuthInfo;

use super::errors::{AuthError, AuthResult};

/// JWT claims for access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Username
    pub sub: String,

    /// Whether the email is verified
    pub verified: bool,

    #[serde(default)]
    pub given_name: String,

    #[serde(default)]
    pub family_name: String,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,

    pub iss: String,
}

impl AuthInfo {
    pub fn from_claims(claims: &Claims) -> Self {
        if claims.verified {
            AuthInfo::verified(claims.sub.clone())
        } else {
            AuthInfo::unverified(claims.sub.clone())
        }
    }
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    ttl: Duration,
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            ttl: Duration::minutes(config.ttl_minutes),
            issuer: config.issuer.clone(),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Issues an HS256 access token for a user
    pub fn issue(&self, user: &Credentials) -> AuthResult<String> {
        let now = Utc::now();

        let claims = Claims {
            sub: user.username.clone(),
            verified: user.verified,
            given_name: user.given_name.clone(),
            family_name: user.family_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    /// Validates a token and extracts its claims
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}
