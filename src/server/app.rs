use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use super::handlers::{health, uploads};
use crate::config::ServiceConfig;
use crate::processing::{SampleSceneProcessor, ScriptProcessor};
use crate::services::{ArchiveIntake, SubmissionService, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub submissions: SubmissionService,
    pub config: Arc<ServiceConfig>,
}

/// Build the router with the bundled sample processor.
pub async fn create_app(
    db: DatabaseConnection,
    config: &ServiceConfig,
    cors_origin: Option<&str>,
) -> Result<Router> {
    create_app_with_processor(db, config, Arc::new(SampleSceneProcessor::new()), cors_origin).await
}

pub async fn create_app_with_processor(
    db: DatabaseConnection,
    config: &ServiceConfig,
    processor: Arc<dyn ScriptProcessor>,
    cors_origin: Option<&str>,
) -> Result<Router> {
    let submissions = SubmissionService::new(
        ArchiveIntake::new(&config.upload_root),
        processor,
        UploadService::new(db),
        &config.result_root,
        config.processing_timeout(),
    );
    let state = AppState {
        submissions,
        config: Arc::new(config.clone()),
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/upload",
            post(uploads::upload_script).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/history", get(uploads::list_history))
        .route("/result/:id", get(uploads::get_result))
        .route("/download/:id", get(uploads::download_result));

    // Single-page frontend: unknown paths fall back to index.html
    let dist = &config.frontend_dist;
    if dist.is_dir() {
        info!("Serving frontend bundle from {}", dist.display());
        app = app.fallback_service(
            ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html"))),
        );
    } else {
        info!("No frontend bundle at {}, serving API only", dist.display());
    }

    let app = app
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
