use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub role: String,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DomainError::Internal(e.to_string()))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, DomainError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_jwt(
    secret: &str,
    email: &str,
    role: &str,
    ttl: Duration,
) -> Result<String, DomainError> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| DomainError::Internal("token expiry overflow".to_string()))?
        .timestamp();

    let claims = Claims {
        sub: email.to_owned(),
        role: role.to_owned(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| DomainError::Internal(e.to_string()))
}

pub fn decode_jwt(secret: &str, token: &str) -> Result<Claims, DomainError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT rejected: {}", e);
        DomainError::Unauthorized("Could not validate credentials".to_string())
    })
}

/// Tokens revoked by logout, kept until they would have expired anyway.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    revoked: DashMap<String, i64>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// `expires_at` is a unix timestamp in seconds
    pub fn revoke(&self, token: &str, expires_at: i64) {
        self.purge_expired();
        self.revoked.insert(token.to_owned(), expires_at);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.contains_key(token)
    }

    /// Drop entries whose expiry has passed; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        before - self.revoked.len()
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

/// Random password that satisfies the strength policy (upper, lower, digit).
pub fn generate_temporary_password(len: usize) -> String {
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";

    let mut rng = rand::thread_rng();
    let all: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
    let mut chars: Vec<u8> = vec![
        UPPER[rng.gen_range(0..UPPER.len())],
        LOWER[rng.gen_range(0..LOWER.len())],
        DIGITS[rng.gen_range(0..DIGITS.len())],
    ];
    while chars.len() < len.max(3) {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}
