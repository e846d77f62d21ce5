//! User Service - account administration

use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;

use crate::domain::validation::{validate_email, validate_password};
use crate::domain::{DomainError, UserRole};
use crate::infrastructure::auth::{generate_temporary_password, hash_password};
use crate::models::farmer::Entity as Farmer;
use crate::models::user::{self, Entity as User};
use crate::services::auth_service::{ensure_email_free, UserInfo};

pub const TEMPORARY_PASSWORD_LEN: usize = 10;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub farmer_id: Option<i32>,
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<UserInfo>, DomainError> {
    let users = User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    Ok(users.into_iter().map(UserInfo::from).collect())
}

pub async fn create_user(
    db: &DatabaseConnection,
    request: CreateUserRequest,
) -> Result<user::Model, DomainError> {
    let email = validate_email(&request.email)?;
    validate_password(&request.password)?;
    let role = match request.role.as_deref() {
        Some(role) => role.parse::<UserRole>()?,
        None => UserRole::default(),
    };

    ensure_email_free(db, &email).await?;
    if let Some(farmer_id) = request.farmer_id {
        Farmer::find_by_id(farmer_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Farmer"))?;
    }

    let created = user::ActiveModel {
        email: Set(email),
        hashed_password: Set(hash_password(&request.password)?),
        role: Set(role.as_str().to_string()),
        farmer_id: Set(request.farmer_id),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created {} account {}", created.role, created.email);
    Ok(created)
}

async fn find_user(db: &DatabaseConnection, id: i32) -> Result<user::Model, DomainError> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))
}

pub async fn delete_user(
    db: &DatabaseConnection,
    acting_user_id: i32,
    id: i32,
) -> Result<(), DomainError> {
    if acting_user_id == id {
        return Err(DomainError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }
    let target = find_user(db, id).await?;
    User::delete_by_id(target.id).exec(db).await?;
    tracing::info!("Deleted user {}", target.email);
    Ok(())
}

/// Replace the password with a random one and hand it back once
pub async fn reset_password(db: &DatabaseConnection, id: i32) -> Result<String, DomainError> {
    let target = find_user(db, id).await?;
    let temporary = generate_temporary_password(TEMPORARY_PASSWORD_LEN);

    let mut active: user::ActiveModel = target.into();
    active.hashed_password = Set(hash_password(&temporary)?);
    let updated = active.update(db).await?;

    tracing::info!("Password reset for {}", updated.email);
    Ok(temporary)
}

pub async fn update_role(
    db: &DatabaseConnection,
    acting_user_id: i32,
    id: i32,
    role: &str,
) -> Result<UserRole, DomainError> {
    let role: UserRole = role.parse()?;
    if acting_user_id == id {
        return Err(DomainError::BadRequest(
            "Cannot change your own admin role".to_string(),
        ));
    }
    let target = find_user(db, id).await?;

    let mut active: user::ActiveModel = target.into();
    active.role = Set(role.as_str().to_string());
    let updated = active.update(db).await?;

    tracing::info!("Role of {} set to {}", updated.email, role);
    Ok(role)
}
