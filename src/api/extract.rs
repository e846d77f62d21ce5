//! Request extractors for the authenticated caller

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::domain::DomainError;
use crate::infrastructure::auth::decode_jwt;
use crate::infrastructure::AppState;
use crate::models::user;
use crate::services::auth_service;

pub const AUTH_COOKIE: &str = "auth_token";

/// The logged-in user, resolved from the bearer token or the auth cookie
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
    pub token: String,
    /// Token expiry, unix seconds
    pub expires_at: i64,
}

/// Same as `CurrentUser`, but only admins get through
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(AUTH_COOKIE)?.strip_prefix('='))
        .find(|t| !t.is_empty())
        .map(str::to_owned)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| DomainError::Unauthorized("Not authenticated".to_string()))?;

        if state.blacklist.is_revoked(&token) {
            return Err(DomainError::Unauthorized("Token has been revoked".to_string()));
        }

        let claims = decode_jwt(&state.config.secret_key, &token)?;
        let user = auth_service::find_by_email(state.db(), &claims.sub)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("User not found".to_string()))?;

        Ok(CurrentUser {
            user,
            token,
            expires_at: claims.exp as i64,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_admin() {
            tracing::warn!("Non-admin {} denied admin route {}", current.user.email, parts.uri.path());
            return Err(DomainError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(current))
    }
}
