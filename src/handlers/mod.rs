//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod analysis;
pub mod genai;
pub mod health;
pub mod upload;

use crate::config::Settings;
use crate::middleware::logging::request_logging_middleware;
use crate::providers::{Generator, OpenAIGenerator, PromptSet};
use crate::services::{QueryPipeline, SummaryPipeline};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub generator: Arc<dyn Generator>,
    pub summary: SummaryPipeline,
    pub query: QueryPipeline,
    /// Parent of every per-request cancellation token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(settings: Settings, generator: Arc<dyn Generator>, shutdown: CancellationToken) -> Self {
        let prompts = Arc::new(PromptSet::default());
        let concurrency = settings.analysis.max_concurrent_generations;

        Self {
            summary: SummaryPipeline::new(generator.clone(), prompts.clone(), concurrency),
            query: QueryPipeline::new(generator.clone(), prompts, concurrency),
            settings,
            generator,
            shutdown,
        }
    }
}

/// Create application router backed by the OpenAI generator
pub async fn create_router(settings: Settings, shutdown: CancellationToken) -> Result<Router> {
    let generator = Arc::new(OpenAIGenerator::new(settings.openai.clone())?);
    info!("Generation backend: {} ({})", generator.name(), settings.openai.model);

    Ok(create_router_with_generator(settings, generator, shutdown))
}

/// Create application router with an injected generator
pub fn create_router_with_generator(
    settings: Settings,
    generator: Arc<dyn Generator>,
    shutdown: CancellationToken,
) -> Router {
    let max_upload_size = settings.request.max_upload_size;
    let cors = build_cors_layer(&settings);
    let app_state = Arc::new(AppState::new(settings, generator, shutdown));

    // Create middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_logging_middleware));

    let router = Router::new()
        .route("/basic-analysis/", post(analysis::basic_analysis))
        .route("/download-error-summary/", post(analysis::download_error_summary))
        .route("/summary-raw-log/", post(genai::summary_raw_log))
        .route("/summary-log/", post(genai::summary_log))
        .route("/query-log/", post(genai::query_log))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .with_state(app_state)
        .layer(middleware_stack);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn build_cors_layer(settings: &Settings) -> Option<CorsLayer> {
    if !settings.security.cors_enabled {
        return None;
    }

    let origins = &settings.security.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
