//! # auth-adapters
//!
//! Argon2-based implementation of `CredentialHasher` and an HMAC-JWT
//! implementation of `TokenAuthority`. The same tokens authenticate both the
//! HTTP API and the realtime gateway.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use domains::ports::{CredentialHasher, TokenAuthority, TokenClaims};
use domains::{DomainError, Result};

pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtAuthority {
    /// Accepts the signing secret (e.g. from an environment variable) and the
    /// token lifetime in hours.
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

impl TokenAuthority for JwtAuthority {
    fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String> {
        let claims = TokenClaims {
            sub: user_id,
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::internal(e))
    }

    fn verify(&self, token: &str) -> Result<Uuid> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &Validation::default())
                .map_err(|_| {
                    DomainError::Unauthenticated("Invalid or expired token".to_owned())
                })?;
        Ok(data.claims.sub)
    }
}

#[derive(Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    /// Produces a PHC string with a fresh random salt.
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::internal(e))
    }

    /// Verifies a password against a stored Argon2 hash.
    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
