use std::env;

use crate::domain::DomainError;

const DEV_SECRET_KEY: &str = "local-dev-secret-key";
/// One year
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub database_url: String,
    pub port: u16,
    pub secret_key: String,
    pub token_ttl_minutes: i64,
    pub cors_allowed_origins: Vec<String>,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub upload_dir: String,
    pub public_upload_url: String,
    pub max_image_bytes: usize,
    /// Requests per client per minute; 0 disables the limiter
    pub rate_limit_per_minute: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub seed_demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            database_url: "sqlite://organic_farm.db?mode=rwc".to_string(),
            port: 8000,
            secret_key: DEV_SECRET_KEY.to_string(),
            token_ttl_minutes: 60 * 24,
            cors_allowed_origins: Vec::new(),
            cookie_domain: None,
            cookie_secure: false,
            upload_dir: "uploads".to_string(),
            public_upload_url: "/uploads".to_string(),
            max_image_bytes: 10 * 1024 * 1024,
            rate_limit_per_minute: 100,
            admin_email: None,
            admin_password: None,
            seed_demo: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DomainError> {
        let defaults = Self::default();
        let environment = Environment::from_env();
        let production = environment == Environment::Production;

        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ if production => {
                return Err(DomainError::Internal(
                    "SECRET_KEY environment variable must be set in production".to_string(),
                ))
            }
            _ => defaults.secret_key,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            secret_key,
            token_ttl_minutes: check_token_ttl(
                parse_var("ACCESS_TOKEN_EXPIRE_MINUTES")?.unwrap_or(defaults.token_ttl_minutes),
            )?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            cookie_domain: env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty()),
            cookie_secure: parse_var("COOKIE_SECURE")?.unwrap_or(production),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            public_upload_url: env::var("PUBLIC_UPLOAD_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_upload_url),
            max_image_bytes: parse_var("MAX_IMAGE_BYTES")?.unwrap_or(defaults.max_image_bytes),
            rate_limit_per_minute: parse_var("RATE_LIMIT_PER_MINUTE")?
                .unwrap_or(defaults.rate_limit_per_minute),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            seed_demo: env::var("SEED_DEMO").is_ok(),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn check_token_ttl(minutes: i64) -> Result<i64, DomainError> {
    if (1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(DomainError::Internal(format!(
            "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_MINUTES, minutes
        )))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, DomainError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DomainError::Internal(format!("Invalid value for {}: '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
