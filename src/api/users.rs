use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::AdminUser;
use crate::domain::DomainError;
use crate::services::auth_service::UserInfo;
use crate::services::user_service::{self, CreateUserRequest};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleQuery {
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/",
    responses(
        (status = 200, description = "All accounts", body = [UserInfo]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserInfo>>, DomainError> {
    Ok(Json(user_service::list_users(&db).await?))
}

pub async fn create_user(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<Value>, DomainError> {
    let user = user_service::create_user(&db, payload).await?;
    Ok(Json(json!({
        "message": "User created",
        "user_id": user.id
    })))
}

pub async fn delete_user(
    State(db): State<DatabaseConnection>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    user_service::delete_user(&db, admin.user.id, id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

pub async fn reset_password(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let temporary_password = user_service::reset_password(&db, id).await?;
    Ok(Json(json!({
        "message": "Password reset",
        "temporary_password": temporary_password
    })))
}

pub async fn update_role(
    State(db): State<DatabaseConnection>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Value>, DomainError> {
    let role = user_service::update_role(&db, admin.user.id, id, &query.role).await?;
    Ok(Json(json!({
        "message": "Role updated",
        "new_role": role
    })))
}
