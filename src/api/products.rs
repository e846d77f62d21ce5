use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::CurrentUser;
use crate::api::form::FormData;
use crate::api::uploads;
use crate::domain::{DomainError, Page, PageRequest};
use crate::infrastructure::AppState;
use crate::models::product;
use crate::services::product_service::{self, ProductForm};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PublicListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Admins only; farmers are always scoped to their own profile
    pub farmer_id: Option<i32>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub qty: f64,
}

#[utoipa::path(
    get,
    path = "/api/v1/products/public",
    params(PublicListQuery),
    responses(
        (status = 200, description = "In-stock products, paginated"),
        (status = 422, description = "Invalid page parameters")
    )
)]
pub async fn list_public(
    State(db): State<DatabaseConnection>,
    Query(query): Query<PublicListQuery>,
) -> Result<Json<Page<product::Model>>, DomainError> {
    let request = PageRequest::from_query(query.page, query.page_size)?;
    Ok(Json(product_service::list_public(&db, request).await?))
}

pub async fn list_products(
    State(db): State<DatabaseConnection>,
    current: CurrentUser,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Page<product::Model>>, DomainError> {
    let request = PageRequest::from_query(query.page, query.page_size)?;
    let page = product_service::list_products(&db, &current.user, query.farmer_id, request).await?;
    Ok(Json(page))
}

pub async fn get_product(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<product::Model>, DomainError> {
    Ok(Json(product_service::get_product(&db, id).await?))
}

/// Create when no `id` field is sent, update otherwise
pub async fn upsert_product(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> Result<Json<Value>, DomainError> {
    let mut form = FormData::read(multipart).await?;
    let product_form = ProductForm {
        id: form.parse("id")?,
        name: form.required("name")?,
        price: form.parse_required("price")?,
        stock_qty: form.parse_required("stock_qty")?,
        unit: form.required("unit")?,
        farmer_id: form.parse("farmer_id")?,
        is_organic: form.flag("is_organic")?,
        picture: form.take_file(),
    };

    let product =
        product_service::upsert_product(state.db(), uploads(&state), &current.user, product_form)
            .await?;
    Ok(Json(json!({
        "status": "success",
        "product_id": product.id
    })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}/stock",
    params(("id" = i32, Path, description = "Product id"), StockQuery),
    responses(
        (status = 200, description = "Stock updated"),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_stock(
    State(db): State<DatabaseConnection>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Value>, DomainError> {
    let new_qty = product_service::update_stock(&db, &current.user, id, query.qty).await?;
    Ok(Json(json!({
        "status": "success",
        "new_qty": new_qty
    })))
}

pub async fn upload_image(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<Value>, DomainError> {
    let mut form = FormData::read(multipart).await?;
    let picture = form
        .take_file()
        .ok_or_else(|| DomainError::BadRequest("No file provided".to_string()))?;

    let image_url =
        product_service::set_image(state.db(), uploads(&state), &current.user, id, &picture).await?;
    Ok(Json(json!({ "image_url": image_url })))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    product_service::delete_product(state.db(), uploads(&state), &current.user, id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}
