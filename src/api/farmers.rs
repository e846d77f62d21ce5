use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::api::extract::{AdminUser, CurrentUser};
use crate::api::form::FormData;
use crate::api::uploads;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::farmer;
use crate::services::farmer_service::{self, FarmerUpdate, FarmerWithProducts, NewFarmer};

#[utoipa::path(
    get,
    path = "/api/v1/farmers/",
    responses(
        (status = 200, description = "All farmers by name")
    )
)]
pub async fn list_farmers(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Vec<farmer::Model>>, DomainError> {
    Ok(Json(farmer_service::list_farmers(&db).await?))
}

pub async fn get_farmer(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<FarmerWithProducts>, DomainError> {
    Ok(Json(farmer_service::get_farmer(&db, id).await?))
}

/// Admin onboarding: profile and login in one go
pub async fn register_farmer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    multipart: Multipart,
) -> Result<Json<Value>, DomainError> {
    let mut form = FormData::read(multipart).await?;
    let new_farmer = NewFarmer {
        name: form.required("name")?,
        email: form.required("email")?,
        password: form.required("password")?,
        location: form.required("location")?,
        bio: form.required("bio")?,
        picture: form.take_file(),
    };

    let created = farmer_service::register_farmer(state.db(), uploads(&state), new_farmer).await?;
    Ok(Json(json!({
        "message": "Farmer and User account created successfully",
        "farmer_id": created.farmer_id,
        "user_id": created.user_id
    })))
}

pub async fn update_farmer(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<Value>, DomainError> {
    let mut form = FormData::read(multipart).await?;
    let changes = FarmerUpdate {
        name: form.text("name").map(str::to_owned),
        location: form.text("location").map(str::to_owned),
        bio: form.text("bio").map(str::to_owned),
        picture: form.take_file(),
    };

    let farmer =
        farmer_service::update_farmer(state.db(), uploads(&state), &current.user, id, changes)
            .await?;
    Ok(Json(json!({
        "message": "Farmer profile updated",
        "farmer_id": farmer.id
    })))
}

pub async fn delete_farmer(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    farmer_service::delete_farmer(&db, id).await?;
    Ok(Json(json!({ "message": "Farmer deleted" })))
}
