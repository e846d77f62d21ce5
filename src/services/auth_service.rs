//! Auth Service - login, self-registration and identity lookup

use chrono::{Duration, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::domain::validation::{require_len, validate_email, validate_password};
use crate::domain::{DomainError, UserRole};
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password};
use crate::infrastructure::config::Config;
use crate::models::farmer;
use crate::models::user::{self, Entity as User};

/// Location stored for farmers who sign up before filling in their profile
pub const UNSPECIFIED_LOCATION: &str = "Not specified";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// The account email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub role: String,
    pub farmer_id: Option<i32>,
}

impl From<user::Model> for UserInfo {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            farmer_id: model.farmer_id,
        }
    }
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DomainError> {
    Ok(User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

/// Fail with 400 when the address already has an account
pub async fn ensure_email_free<C: ConnectionTrait>(db: &C, email: &str) -> Result<(), DomainError> {
    if find_by_email(db, email).await?.is_some() {
        return Err(DomainError::BadRequest("Email already registered".to_string()));
    }
    Ok(())
}

fn issue_token(config: &Config, user: &user::Model) -> Result<TokenResponse, DomainError> {
    let ttl = Duration::try_minutes(config.token_ttl_minutes).ok_or_else(|| {
        DomainError::Internal(format!("Token lifetime out of range: {} minutes", config.token_ttl_minutes))
    })?;
    let access_token = create_jwt(&config.secret_key, &user.email, &user.role, ttl)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        role: user.role.clone(),
        email: user.email.clone(),
    })
}

pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    request: LoginRequest,
) -> Result<TokenResponse, DomainError> {
    let invalid = || DomainError::Unauthorized("Invalid email or password".to_string());

    let user = find_by_email(db, &request.username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&request.password, &user.hashed_password)? {
        tracing::warn!("Failed login for {}", user.email);
        return Err(invalid());
    }

    tracing::info!("User {} logged in", user.email);
    issue_token(config, &user)
}

/// Create a farmer profile plus its login in one transaction
pub async fn register(
    db: &DatabaseConnection,
    config: &Config,
    request: RegisterRequest,
) -> Result<TokenResponse, DomainError> {
    let name = require_len("name", &request.name, 2, 100)?;
    let email = validate_email(&request.email)?;
    validate_password(&request.password)?;
    let location = match request.location.as_deref() {
        Some(location) if !location.trim().is_empty() => {
            require_len("location", location, 5, 200)?
        }
        _ => UNSPECIFIED_LOCATION.to_string(),
    };

    ensure_email_free(db, &email).await?;
    let hashed_password = hash_password(&request.password)?;

    let txn = db.begin().await?;

    let farmer = farmer::ActiveModel {
        name: Set(name),
        location: Set(location),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let user = user::ActiveModel {
        email: Set(email),
        hashed_password: Set(hashed_password),
        role: Set(UserRole::Farmer.as_str().to_string()),
        farmer_id: Set(Some(farmer.id)),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!("Registered farmer {} with user {}", farmer.id, user.email);
    issue_token(config, &user)
}
