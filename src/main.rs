use std::process::ExitCode;

use organic_farm::infrastructure::logging::init_tracing;
use organic_farm::{config, db, seed, server, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    dotenvy::dotenv().ok();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = seed::seed(&db, &config).await {
        tracing::error!("Failed to seed data: {}", e);
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        tracing::error!("Failed to create upload directory {}: {}", config.upload_dir, e);
        return ExitCode::FAILURE;
    }

    let port = config.port;
    let state = AppState::new(db, config);

    match server::serve(state, port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
