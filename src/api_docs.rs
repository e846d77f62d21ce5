use crate::api;
use crate::domain::{OrderStatus, UserRole};
use crate::services::{auth_service, order_service, user_service};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::login,
        api::auth::register,
        api::auth::me,
        api::products::list_public,
        api::products::update_stock,
        api::orders::create_order,
        api::orders::list_orders,
        api::orders::track_order,
        api::farmers::list_farmers,
        api::users::list_users,
    ),
    components(
        schemas(
            OrderStatus,
            UserRole,
            auth_service::LoginRequest,
            auth_service::RegisterRequest,
            auth_service::TokenResponse,
            auth_service::UserInfo,
            order_service::CreateOrderRequest,
            order_service::OrderItemRequest,
            order_service::OrderWithItems,
            order_service::OrderItemView,
            user_service::CreateUserRequest,
        )
    ),
    tags(
        (name = "organic-farm", description = "Organic farm marketplace API")
    )
)]
pub struct ApiDoc;
