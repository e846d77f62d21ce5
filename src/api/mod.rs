pub mod auth;
pub mod error;
pub mod extract;
pub mod farmers;
pub mod form;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::infrastructure::AppState;
use crate::services::upload_service::Uploads;

fn uploads(state: &AppState) -> Uploads<'_> {
    Uploads::new(state.images.as_ref(), state.config.max_image_bytes)
}

/// Collection routes answer with and without the trailing slash
pub fn api_router(state: AppState) -> Router {
    let product_root = get(products::list_products).post(products::upsert_product);
    let order_root = get(orders::list_orders).post(orders::create_order);
    let farmer_root = get(farmers::list_farmers).post(farmers::register_farmer);
    let user_root = get(users::list_users).post(users::create_user);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Products
        .route("/products/public", get(products::list_public))
        .route("/products", product_root.clone())
        .route("/products/", product_root)
        .route("/products/upsert", post(products::upsert_product))
        .route(
            "/products/:id",
            get(products::get_product).delete(products::delete_product),
        )
        .route("/products/:id/stock", patch(products::update_stock))
        .route("/products/:id/image", post(products::upload_image))
        // Orders
        .route("/orders", order_root.clone())
        .route("/orders/", order_root)
        .route("/orders/track", get(orders::track_order))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/orders/:id/cancel", patch(orders::cancel_order))
        .route(
            "/orders/:id/items/:item_id/harvest",
            patch(orders::mark_harvested),
        )
        // Farmers
        .route("/farmers", farmer_root.clone())
        .route("/farmers/", farmer_root)
        .route(
            "/farmers/:id",
            get(farmers::get_farmer)
                .put(farmers::update_farmer)
                .delete(farmers::delete_farmer),
        )
        // Users
        .route("/users", user_root.clone())
        .route("/users/", user_root)
        .route("/users/:id", axum::routing::delete(users::delete_user))
        .route("/users/:id/reset-password", post(users::reset_password))
        .route("/users/:id/role", patch(users::update_role))
        .with_state(state)
}
