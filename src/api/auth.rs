use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::extract::{CurrentUser, AUTH_COOKIE};
use crate::domain::DomainError;
use crate::infrastructure::config::Config;
use crate::infrastructure::AppState;
use crate::services::auth_service::{self, LoginRequest, RegisterRequest, TokenResponse, UserInfo};

fn cookie_attributes(config: &Config, max_age: i64) -> String {
    let mut attrs = format!("Path=/; HttpOnly; SameSite=Lax; Max-Age={}", max_age);
    if config.cookie_secure {
        attrs.push_str("; Secure");
    }
    if let Some(domain) = &config.cookie_domain {
        attrs.push_str("; Domain=");
        attrs.push_str(domain);
    }
    attrs
}

fn with_auth_cookie(config: &Config, token: TokenResponse) -> Response {
    let cookie = format!(
        "{}={}; {}",
        AUTH_COOKIE,
        token.access_token,
        cookie_attributes(config, config.token_ttl_minutes.saturating_mul(60))
    );
    ([(header::SET_COOKIE, cookie)], Json(token)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, DomainError> {
    let token = auth_service::login(state.db(), &state.config, payload).await?;
    Ok(with_auth_cookie(&state.config, token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Farmer account created", body = TokenResponse),
        (status = 400, description = "Email taken or weak password")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, DomainError> {
    let token = auth_service::register(state.db(), &state.config, payload).await?;
    Ok(with_auth_cookie(&state.config, token))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(current: CurrentUser) -> Json<UserInfo> {
    Json(UserInfo::from(current.user))
}

pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Response {
    state.blacklist.revoke(&current.token, current.expires_at);
    tracing::info!("User {} logged out", current.user.email);

    let cookie = format!("{}=; {}", AUTH_COOKIE, cookie_attributes(&state.config, 0));
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "detail": "Successfully logged out" })),
    )
        .into_response()
}
