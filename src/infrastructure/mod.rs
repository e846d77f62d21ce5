//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and migrations (db)
//! - HTTP server setup (server)
//! - Configuration loading (config)
//! - Password hashing, tokens and revocation (auth)
//! - Upload storage, rate limiting and logging
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod rate_limit;
pub mod seed;
pub mod server;
pub mod state;
pub mod storage;

pub use state::AppState;
