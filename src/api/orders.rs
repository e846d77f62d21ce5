use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::{AdminUser, CurrentUser};
use crate::domain::{DomainError, Page, PageRequest};
use crate::services::order_service::{self, CreateOrderRequest, OrderFilter, OrderWithItems};

/// Status is kept as text so an unknown value reports 422, not a query rejection
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub farmer_id: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackQuery {
    pub order_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub status: String,
    /// `YYYY-MM-DD`
    pub delivery_date: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HarvestQuery {
    pub harvested: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order placed"),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "Unknown product"),
        (status = 422, description = "Invalid order")
    )
)]
pub async fn create_order(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Value>, DomainError> {
    let order_id = order_service::create_order(&db, payload).await?;
    Ok(Json(json!({
        "status": "success",
        "order_id": order_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/",
    params(ListOrdersQuery),
    responses(
        (status = 200, description = "Orders, newest first"),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Unknown status or bad page parameters")
    )
)]
pub async fn list_orders(
    State(db): State<DatabaseConnection>,
    current: CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Page<OrderWithItems>>, DomainError> {
    let request = PageRequest::from_query(query.page, query.page_size)?;
    let filter = OrderFilter {
        status: query.status,
        farmer_id: query.farmer_id,
    };
    Ok(Json(
        order_service::list_orders(&db, &current.user, filter, request).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/track",
    params(TrackQuery),
    responses(
        (status = 200, description = "Order with items", body = OrderWithItems),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Missing or invalid order id or email")
    )
)]
pub async fn track_order(
    State(db): State<DatabaseConnection>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<OrderWithItems>, DomainError> {
    Ok(Json(
        order_service::track_order(&db, query.order_id.as_deref(), query.email.as_deref()).await?,
    ))
}

pub async fn update_status(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, DomainError> {
    let new_status =
        order_service::update_status(&db, id, &query.status, query.delivery_date.as_deref())
            .await?;
    Ok(Json(json!({
        "status": "updated",
        "new_status": new_status
    })))
}

pub async fn cancel_order(
    State(db): State<DatabaseConnection>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    order_service::cancel_order(&db, id).await?;
    Ok(Json(json!({
        "status": "cancelled",
        "message": "Order cancelled. Stock restored."
    })))
}

pub async fn mark_harvested(
    State(db): State<DatabaseConnection>,
    current: CurrentUser,
    Path((order_id, item_id)): Path<(i32, i32)>,
    Query(query): Query<HarvestQuery>,
) -> Result<Json<Value>, DomainError> {
    let harvested = query.harvested.unwrap_or(true);
    let item =
        order_service::mark_harvested(&db, &current.user, order_id, item_id, harvested).await?;
    Ok(Json(json!({
        "status": "updated",
        "item_id": item.id,
        "is_harvested": item.is_harvested
    })))
}
