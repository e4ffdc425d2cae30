//! HTTP API Layer
//!
//! This crate provides the REST API for the fraud scoring engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for scoring, claim records and analytics
//! - **Middleware**: Tracing and audit logging
//! - **DTOs**: Request/Response data transfer objects, validated with `validator`
//! - **Store**: In-memory adapter for scored claim records
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::from_config(config)?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod store;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_fraud::{ClaimRecordPort, EnsembleConfig, FraudEngine, FraudError};

use crate::config::ApiConfig;
use crate::middleware::audit_middleware;
use crate::handlers::{analytics, claims, health, predict};
use crate::store::InMemoryClaimStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FraudEngine>,
    pub claims: Arc<dyn ClaimRecordPort>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(engine: Arc<FraudEngine>, claims: Arc<dyn ClaimRecordPort>, config: ApiConfig) -> Self {
        Self {
            engine,
            claims,
            config: Arc::new(config),
        }
    }

    /// Default ensemble over the configured model directory and an empty
    /// in-memory claim store. No model is loaded here.
    pub fn from_config(config: ApiConfig) -> Result<Self, FraudError> {
        let engine = FraudEngine::with_artifact_dir(EnsembleConfig::default(), config.model_dir.clone())?;
        Ok(Self::new(Arc::new(engine), Arc::new(InMemoryClaimStore::new()), config))
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Engine, claim store and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/status", get(health::api_status))
        .route("/predict-fraud", post(predict::predict_fraud))
        .route("/predict-fraud/ensemble", post(predict::predict_fraud_ensemble))
        .route("/claims", post(claims::create_claim).get(claims::list_claims))
        .route("/analytics", get(analytics::get_analytics))
        .route("/fraud-stats", get(analytics::fraud_statistics));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(audit_middleware))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
