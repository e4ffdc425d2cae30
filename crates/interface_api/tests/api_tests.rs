//! HTTP API tests for interface_api
//!
//! Drives the router in-process with axum-test.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use domain_fraud::{ArtifactStore, FraudEngine, LifecycleState, ModelRepository, RiskLevel, ScorerKind};
use interface_api::config::ApiConfig;
use interface_api::dto::analytics::AnalyticsResponse;
use interface_api::dto::claims::{ClaimCreatedResponse, ClaimRecordResponse};
use interface_api::dto::prediction::FraudPredictionResponse;
use interface_api::dto::status::{HealthResponse, StatusResponse};
use interface_api::error::ErrorResponse;
use interface_api::middleware::REQUEST_ID_HEADER;
use interface_api::store::InMemoryClaimStore;
use interface_api::{create_router, AppState};
use test_utils::*;

fn server_with(repository: Arc<dyn ModelRepository>, config: ApiConfig) -> TestServer {
    let engine = FraudEngine::new(TrainingFixtures::fast_config(), repository).unwrap();
    let state = AppState::new(Arc::new(engine), Arc::new(InMemoryClaimStore::new()), config);
    TestServer::new(create_router(state)).unwrap()
}

fn server_for_dir(dir: &Path) -> TestServer {
    let config = ApiConfig {
        model_dir: dir.to_path_buf(),
        ..ApiConfig::default()
    };
    server_with(Arc::new(ArtifactStore::new(dir)), config)
}

// ============================================================================
// Health and Status Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_root_reports_running() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server.get("/").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["ai_enabled"], true);
    }

    #[tokio::test]
    async fn test_health_reports_unfitted_ensemble() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.components.ml_models, LifecycleState::Unfitted);
    }

    #[tokio::test]
    async fn test_ready_without_preload_even_when_unfitted() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());
        server.get("/health/ready").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_not_ready_when_preload_required_and_unfitted() {
        let (dir, store) = empty_artifact_store();
        let config = ApiConfig {
            model_dir: dir.path().to_path_buf(),
            preload_models: true,
            ..ApiConfig::default()
        };
        let server = server_with(Arc::new(store), config);

        let response = server.get("/health/ready").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "not_ready");
    }

    #[tokio::test]
    async fn test_status_lists_endpoints() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let body: StatusResponse = server.get("/api/v1/status").await.json();
        assert!(!body.models_loaded);
        assert_eq!(body.ensemble_state, LifecycleState::Unfitted);
        assert_eq!(body.total_claims_processed, 0);
        assert!(body.endpoints.iter().any(|e| e == "/api/v1/predict-fraud/ensemble"));
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server.get("/health").await;
        let id = response.header(REQUEST_ID_HEADER);
        assert!(id.to_str().unwrap().starts_with("REQ-"));
    }
}

// ============================================================================
// Heuristic Prediction Tests
// ============================================================================

mod heuristic_tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_claim_is_high_or_critical() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server
            .post("/api/v1/predict-fraud")
            .json(&ClaimFixtures::reference_claim())
            .await;
        response.assert_status_ok();

        let body: FraudPredictionResponse = response.json();
        // base score 0.8 with jitter of at most 0.05 either way
        assert!((0.75..=0.85).contains(&body.fraud_probability));
        assert!(matches!(body.risk_level, RiskLevel::High | RiskLevel::Critical));
        assert!((0.85..=0.98).contains(&body.confidence));
        assert_eq!(body.model_version, "heuristic_v1.0");
        assert_eq!(body.scorer, ScorerKind::Heuristic);
        assert!(body.processing_time.ends_with(" seconds"));
        assert!(body.model_scores.is_empty());
    }

    #[tokio::test]
    async fn test_heuristic_works_without_models() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server
            .post("/api/v1/predict-fraud")
            .json(&ClaimFixtures::low_risk_claim())
            .await;
        response.assert_status_ok();
        let body: FraudPredictionResponse = response.json();
        assert_eq!(body.risk_level, RiskLevel::Low);
        assert!(body.risk_factors.is_empty());
    }

    #[tokio::test]
    async fn test_negative_amount_is_unprocessable() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let claim = ClaimFeaturesBuilder::new().with_amount(-5.0).build();
        let response = server.post("/api/v1/predict-fraud").json(&claim).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "validation_error");
        let details = body.details.unwrap();
        assert!(details.iter().any(|d| d.starts_with("claim_amount")));
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server
            .post("/api/v1/predict-fraud")
            .json(&json!({ "claim_amount": 1000.0, "claim_type": "Auto" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

// ============================================================================
// Ensemble Prediction Tests
// ============================================================================

mod ensemble_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_artifacts_is_service_unavailable() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let response = server
            .post("/api/v1/predict-fraud/ensemble")
            .json(&ModelClaimFixtures::daytime_claim())
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = response.json();
        assert_eq!(body.error, "models_unavailable");

        let status: StatusResponse = server.get("/api/v1/status").await.json();
        assert_eq!(status.ensemble_state, LifecycleState::Unfitted);
    }

    #[tokio::test]
    async fn test_trained_models_score_and_report_per_model() {
        let artifacts = TrainedArtifacts::fast();
        let server = server_for_dir(artifacts.dir.path());

        let response = server
            .post("/api/v1/predict-fraud/ensemble")
            .json(&ModelClaimFixtures::night_claim())
            .await;
        response.assert_status_ok();

        let body: FraudPredictionResponse = response.json();
        assert_eq!(body.scorer, ScorerKind::Ensemble);
        assert_eq!(body.model_version, "ensemble_v1.0");
        assert_eq!(
            body.model_scores.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["neural_net", "random_forest", "xgboost"]
        );
        assert!((0.0..=1.0).contains(&body.fraud_probability));

        let status: StatusResponse = server.get("/api/v1/status").await.json();
        assert!(status.models_loaded);
        assert_eq!(status.ensemble_state, LifecycleState::Fitted);
    }

    #[tokio::test]
    async fn test_out_of_range_hour_is_unprocessable() {
        let artifacts = TrainedArtifacts::fast();
        let server = server_for_dir(artifacts.dir.path());

        let claim = ModelClaimBuilder::new().with_hour(24).build();
        let response = server.post("/api/v1/predict-fraud/ensemble").json(&claim).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    async fn score_daytime(server: &TestServer) -> StatusCode {
        server
            .post("/api/v1/predict-fraud/ensemble")
            .json(&ModelClaimFixtures::daytime_claim())
            .await
            .status_code()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let artifacts = TrainedArtifacts::fast();
        let repository = Arc::new(
            CountingRepository::new(artifacts.store.clone())
                .with_load_delay(std::time::Duration::from_millis(100)),
        );
        let server = server_with(repository.clone(), ApiConfig::default());

        let statuses = tokio::join!(
            score_daytime(&server),
            score_daytime(&server),
            score_daytime(&server),
            score_daytime(&server),
            score_daytime(&server),
            score_daytime(&server),
        );
        let statuses = [statuses.0, statuses.1, statuses.2, statuses.3, statuses.4, statuses.5];
        assert!(statuses.iter().all(|s| *s == StatusCode::OK));
        assert_eq!(repository.loads(), 1);
    }
}

// ============================================================================
// Claims and Analytics Tests
// ============================================================================

mod claims_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_claim_assigns_sequential_numbers() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let first = server.post("/api/v1/claims").json(&ClaimFixtures::reference_claim()).await;
        first.assert_status(StatusCode::CREATED);
        let first: ClaimCreatedResponse = first.json();
        assert!(first.claim_created);
        assert_eq!(first.claim_id, 1);
        assert!(first.message.starts_with("Claim 1 created with "));

        let second: ClaimCreatedResponse = server
            .post("/api/v1/claims")
            .json(&ClaimFixtures::low_risk_claim())
            .await
            .json();
        assert_eq!(second.claim_id, 2);

        let listed: Vec<ClaimRecordResponse> = server.get("/api/v1/claims").await.json();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].claim_amount, 75_000.0);
        assert_eq!(listed[1].claim_type, "Home Damage");
        assert_eq!(listed[0].fraud_score, first.fraud_analysis.fraud_probability);
    }

    #[tokio::test]
    async fn test_invalid_claim_is_not_stored() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let claim = ClaimFeaturesBuilder::new().with_claim_type("").build();
        server
            .post("/api/v1/claims")
            .json(&claim)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let listed: Vec<ClaimRecordResponse> = server.get("/api/v1/claims").await.json();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_amounts_never_reach_statistics() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        for _ in 0..2 {
            let claim = ClaimFeaturesBuilder::new().with_amount(5e28).build();
            let response = server.post("/api/v1/claims").json(&claim).await;
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
            let body: ErrorResponse = response.json();
            assert!(body.details.unwrap().iter().any(|d| d.starts_with("claim_amount")));
        }

        let stats: Value = server.get("/api/v1/fraud-stats").await.json();
        assert_eq!(stats, json!({ "message": "No claims processed yet" }));
    }

    #[tokio::test]
    async fn test_empty_analytics_are_zero() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        let body: AnalyticsResponse = server.get("/api/v1/analytics").await.json();
        assert_eq!(body.total_claims, 0);
        assert_eq!(body.avg_fraud_score, 0.0);
        assert_eq!(body.savings_estimate, 0.0);

        let stats: Value = server.get("/api/v1/fraud-stats").await.json();
        assert_eq!(stats, json!({ "message": "No claims processed yet" }));
    }

    #[tokio::test]
    async fn test_analytics_over_stored_claims() {
        let (dir, _store) = empty_artifact_store();
        let server = server_for_dir(dir.path());

        for claim in [ClaimFixtures::reference_claim(), ClaimFixtures::low_risk_claim()] {
            server
                .post("/api/v1/claims")
                .json(&claim)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let body: AnalyticsResponse = server.get("/api/v1/analytics").await.json();
        assert_eq!(body.total_claims, 2);
        assert_eq!(body.fraud_detected, 1);
        assert_eq!(body.high_risk_claims, 1);
        assert_eq!(body.savings_estimate, 50_000.0);
        assert!((0.37..=0.45).contains(&body.avg_fraud_score));

        let stats: Value = server.get("/api/v1/fraud-stats").await.json();
        assert_eq!(stats["total_claims"], 2);
        assert_eq!(stats["fraud_detection_rate"], "50.0%");
        assert_eq!(stats["average_claim_amount"], "$38,100.00");
        assert_eq!(stats["total_claims_value"], "$76,200.00");
        assert_eq!(stats["estimated_fraud_prevented"], "$50,000.00");
        assert_eq!(stats["risk_distribution"]["Low"], 1);
    }
}
