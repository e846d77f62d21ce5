use axum::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "organic-farm",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Farm API" }))
}
