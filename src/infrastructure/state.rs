//! Application state containing the connection pool and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::ImageStore;
use crate::infrastructure::auth::TokenBlacklist;
use crate::infrastructure::config::Config;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::storage::LocalImageStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    /// Tokens revoked by logout
    pub blacklist: Arc<TokenBlacklist>,
    /// Product pictures and farmer profile pictures
    pub images: Arc<dyn ImageStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Create a new AppState with local image storage
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let images = Arc::new(LocalImageStore::new(
            &config.upload_dir,
            &config.public_upload_url,
        ));
        Self::with_image_store(db, config, images)
    }

    pub fn with_image_store(
        db: DatabaseConnection,
        config: Config,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute));
        Self {
            db,
            config: Arc::new(config),
            blacklist: Arc::new(TokenBlacklist::new()),
            images,
            rate_limiter,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AsRef<DatabaseConnection> for AppState {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Lets handlers that only need the pool extract `State<DatabaseConnection>`
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
