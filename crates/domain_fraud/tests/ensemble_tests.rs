//! Ensemble tests for domain_fraud: lifecycle, persistence and training

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use domain_fraud::features::FeatureVector;
use domain_fraud::prediction::ENSEMBLE_MODEL_VERSION;
use domain_fraud::{
    EnsembleConfig, EnsembleScorer, EnsembleWeights, FraudEngine, FraudError, LifecycleState,
    ModelRepository, ModelVariant, RiskPolicy, ScorerKind,
};
use proptest::prelude::*;
use test_utils::*;

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_no_artifacts_is_model_load_error() {
        let (_dir, store) = empty_artifact_store();
        let scorer = EnsembleScorer::new(EnsembleConfig::default(), Arc::new(store)).unwrap();

        assert_eq!(scorer.state().unwrap(), LifecycleState::Unfitted);
        let result = scorer.score(&ModelClaimFixtures::daytime_claim());
        assert!(matches!(result, Err(FraudError::ModelLoad(_))));
        // a failed load returns to Unfitted so a later call can retry
        assert_eq!(scorer.state().unwrap(), LifecycleState::Unfitted);
    }

    #[test]
    fn test_invalid_claim_rejected_before_loading() {
        let (_dir, store) = empty_artifact_store();
        let repository = Arc::new(CountingRepository::new(store));
        let scorer = EnsembleScorer::new(EnsembleConfig::default(), repository.clone()).unwrap();

        let claim = ModelClaimBuilder::new().with_hour(30).build();
        assert!(matches!(scorer.score(&claim), Err(FraudError::Validation(_))));
        assert_eq!(repository.loads(), 0);
    }

    #[test]
    fn test_weights_summing_to_point_nine_refuse_construction() {
        let (_dir, store) = empty_artifact_store();
        let config = EnsembleConfig {
            weights: EnsembleWeights {
                random_forest: 0.4,
                xgboost: 0.3,
                neural_net: 0.2,
            },
            ..EnsembleConfig::default()
        };
        let result = EnsembleScorer::new(config.clone(), Arc::new(store.clone()));
        assert!(matches!(result, Err(FraudError::Configuration(_))));
        assert!(FraudEngine::new(config, Arc::new(store)).is_err());
    }

    #[test]
    fn test_first_score_loads_then_stays_fitted() {
        let artifacts = TrainedArtifacts::fast();
        let repository = Arc::new(CountingRepository::new(artifacts.store.clone()));
        let scorer = EnsembleScorer::new(TrainingFixtures::fast_config(), repository.clone()).unwrap();

        let first = scorer.score(&ModelClaimFixtures::daytime_claim()).unwrap();
        let second = scorer.score(&ModelClaimFixtures::night_claim()).unwrap();

        assert_eq!(scorer.state().unwrap(), LifecycleState::Fitted);
        assert_eq!(repository.loads(), 1);
        assert_eq!(first.scorer, ScorerKind::Ensemble);
        assert_eq!(first.model_version, ENSEMBLE_MODEL_VERSION);
        assert_eq!(second.model_scores.len(), 3);
        assert_probability_bounds(&first);
        assert_risk_consistent(&first, &RiskPolicy::ENSEMBLE);
    }

    #[test]
    fn test_concurrent_first_requests_load_once() {
        let artifacts = TrainedArtifacts::fast();
        let repository = Arc::new(
            CountingRepository::new(artifacts.store.clone()).with_load_delay(Duration::from_millis(150)),
        );
        let scorer = Arc::new(EnsembleScorer::new(TrainingFixtures::fast_config(), repository.clone()).unwrap());

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let scorer = Arc::clone(&scorer);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    scorer.score(&ModelClaimFixtures::night_claim())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert_eq!(repository.loads(), 1);
        for result in &results[1..] {
            assert_same_prediction(&results[0], result);
        }
    }

    #[test]
    fn test_failed_load_can_be_retried_after_artifacts_appear() {
        let (dir, store) = empty_artifact_store();
        let repository = Arc::new(CountingRepository::new(store.clone()));
        let scorer = EnsembleScorer::new(TrainingFixtures::fast_config(), repository.clone()).unwrap();
        assert!(scorer.score(&ModelClaimFixtures::daytime_claim()).is_err());

        let trained = TrainedArtifacts::fast();
        let ensemble = trained.store.load().unwrap();
        store.save(&ensemble, &trained.report).unwrap();

        assert!(scorer.score(&ModelClaimFixtures::daytime_claim()).is_ok());
        assert_eq!(repository.loads(), 2);
        drop(dir);
    }

    #[test]
    fn test_install_swaps_model_set() {
        let (_dir, store) = empty_artifact_store();
        let repository = Arc::new(CountingRepository::new(store));
        let scorer = EnsembleScorer::new(TrainingFixtures::fast_config(), repository.clone()).unwrap();

        let first = TrainedArtifacts::fast();
        let installed = scorer.install(first.store.load().unwrap());
        assert_eq!(scorer.state().unwrap(), LifecycleState::Fitted);

        let held = scorer.ensure_loaded().unwrap();
        let second = TrainedArtifacts::fast();
        scorer.install(second.store.load().unwrap());

        // callers holding the old set keep it; new calls see the new one
        assert_eq!(held.run_id(), installed.run_id());
        assert_eq!(scorer.ensure_loaded().unwrap().run_id(), second.report.run_id);
        assert_eq!(repository.loads(), 0);
    }
}

// ============================================================================
// Persistence Tests
// ============================================================================

mod persistence_tests {
    use super::*;

    #[test]
    fn test_reload_is_bit_identical() {
        let artifacts = TrainedArtifacts::fast();
        let first = artifacts.store.load().unwrap();
        let second = artifacts.store.load().unwrap();

        let claims = [
            ModelClaimFixtures::daytime_claim(),
            ModelClaimFixtures::night_claim(),
            ModelClaimBuilder::new().with_amount(123_456.78).with_history(7).build(),
        ];
        for claim in &claims {
            let features = FeatureVector::derive(claim).unwrap();
            let a = first.model_probabilities(&features).unwrap();
            let b = second.model_probabilities(&features).unwrap();
            for ((va, pa), (vb, pb)) in a.iter().zip(&b) {
                assert_eq!(va, vb);
                assert_eq!(pa.to_bits(), pb.to_bits(), "{va} drifted after reload");
            }
        }
        assert_eq!(first.scaler(), second.scaler());
    }

    #[test]
    fn test_trained_and_reloaded_models_agree() {
        let data = TrainingFixtures::small_dataset();
        let config = TrainingFixtures::fast_config();
        let (trained, report) = domain_fraud::train_ensemble(&data, &config).unwrap();

        let (_dir, store) = empty_artifact_store();
        store.save(&trained, &report).unwrap();
        let reloaded = store.load().unwrap();

        let features = FeatureVector::derive(&ModelClaimFixtures::night_claim()).unwrap();
        let before = trained.model_probabilities(&features).unwrap();
        let after = reloaded.model_probabilities(&features).unwrap();
        for ((_, pb), (_, pa)) in before.iter().zip(&after) {
            assert_eq!(pb.to_bits(), pa.to_bits());
        }
        assert_eq!(store.read_report().unwrap(), report);
    }

    #[test]
    fn test_every_artifact_written() {
        let artifacts = TrainedArtifacts::fast();
        assert!(artifacts.store.is_complete());
        for variant in ModelVariant::ALL {
            assert!(artifacts.store.artifact_path(variant.artifact_name()).is_file());
        }
        assert!(artifacts.store.artifact_path("scaler").is_file());
    }

    #[test]
    fn test_missing_single_artifact_is_model_load_error() {
        let artifacts = TrainedArtifacts::fast();
        std::fs::remove_file(artifacts.store.artifact_path("neural_net")).unwrap();
        assert!(matches!(artifacts.store.load(), Err(FraudError::ModelLoad(_))));
    }

    #[test]
    fn test_mixed_runs_rejected() {
        let first = TrainedArtifacts::fast();
        let second = TrainedArtifacts::fast();
        std::fs::copy(
            second.store.artifact_path("xgboost"),
            first.store.artifact_path("xgboost"),
        )
        .unwrap();
        assert!(matches!(first.store.load(), Err(FraudError::ModelLoad(_))));
    }
}

// ============================================================================
// Corrupt Payload Tests
// ============================================================================

mod corrupt_payload_tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc;

    fn assert_load_rejected(artifacts: &TrainedArtifacts, fragment: &str) {
        match artifacts.store.load() {
            Err(FraudError::ModelLoad(msg)) => assert!(msg.contains(fragment), "unexpected message: {msg}"),
            other => panic!("expected ModelLoad, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_neural_output_layer_rejected() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("neural_net", |payload| {
            let layers = payload["layers"].as_array_mut().unwrap();
            let last = layers.len() - 1;
            layers[last] = json!({ "weights": [], "biases": [] });
        });
        assert_load_rejected(&artifacts, "neural_net");
    }

    #[test]
    fn test_mismatched_neural_layer_width_rejected() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("neural_net", |payload| {
            payload["layers"][1]["weights"][0].as_array_mut().unwrap().push(json!(0.0));
        });
        assert_load_rejected(&artifacts, "layer 1 expects");
    }

    #[test]
    fn test_forest_child_out_of_range_rejected() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("random_forest", |payload| {
            payload["trees"][0] = json!({ "nodes": [
                { "kind": "split", "feature": 0, "threshold": 0.0, "left": 1, "right": 5 },
                { "kind": "leaf", "value": 0.2 }
            ] });
        });
        assert_load_rejected(&artifacts, "random_forest tree 0");
    }

    #[test]
    fn test_boosting_feature_out_of_range_rejected() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("xgboost", |payload| {
            payload["trees"][0] = json!({ "nodes": [
                { "kind": "split", "feature": 40, "threshold": 0.0, "left": 1, "right": 2 },
                { "kind": "leaf", "value": -0.1 },
                { "kind": "leaf", "value": 0.1 }
            ] });
        });
        assert_load_rejected(&artifacts, "xgboost tree 0");
    }

    #[test]
    fn test_scaler_length_mismatch_rejected() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("scaler", |payload| {
            payload["scales"].as_array_mut().unwrap().pop();
        });
        assert_load_rejected(&artifacts, "scaler");
    }

    #[test]
    fn test_cyclic_tree_fails_fast_and_allows_retry() {
        let artifacts = TrainedArtifacts::fast();
        artifacts.edit_payload("random_forest", |payload| {
            payload["trees"][0] = json!({ "nodes": [
                { "kind": "split", "feature": 0, "threshold": 0.0, "left": 0, "right": 0 }
            ] });
        });
        let engine = Arc::new(
            FraudEngine::new(TrainingFixtures::fast_config(), Arc::new(artifacts.store.clone())).unwrap(),
        );

        let (tx, rx) = mpsc::channel();
        let scoring = engine.clone();
        thread::spawn(move || {
            let result = scoring.score_ensemble(&ModelClaimFixtures::daytime_claim());
            let _ = tx.send(result.map(|r| r.fraud_probability));
        });

        let result = rx.recv_timeout(Duration::from_secs(5)).expect("scoring must not block");
        assert!(matches!(result, Err(FraudError::ModelLoad(_))));
        assert_eq!(engine.ensemble_state().unwrap(), LifecycleState::Unfitted);
    }
}

// ============================================================================
// Engine Tests
// ============================================================================

mod engine_tests {
    use super::*;

    #[test]
    fn test_train_persists_and_installs() {
        let (_dir, store) = empty_artifact_store();
        let repository = Arc::new(CountingRepository::new(store.clone()));
        let engine = FraudEngine::new(TrainingFixtures::fast_config(), repository.clone()).unwrap();

        assert!(matches!(
            engine.score_ensemble(&ModelClaimFixtures::daytime_claim()),
            Err(FraudError::ModelLoad(_))
        ));

        let report = engine.train_ensemble(&TrainingFixtures::small_dataset()).unwrap();
        assert_eq!(repository.saves(), 1);
        assert!(store.is_complete());
        assert_eq!(engine.ensemble_state().unwrap(), LifecycleState::Fitted);

        let result = engine.score_ensemble(&ModelClaimFixtures::daytime_claim()).unwrap();
        assert_eq!(result.model_scores.len(), 3);
        assert_eq!(report.models.len(), 3);
        // the earlier failed attempt is the only load
        assert_eq!(repository.loads(), 1);
    }

    #[test]
    fn test_ensemble_confidence_is_model_agreement() {
        let artifacts = TrainedArtifacts::fast();
        let engine = FraudEngine::new(TrainingFixtures::fast_config(), Arc::new(artifacts.store.clone())).unwrap();
        let result = engine.score_ensemble(&ModelClaimFixtures::night_claim()).unwrap();

        let scores: Vec<f64> = result.model_scores.values().copied().collect();
        let spread = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - scores.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!((result.confidence.value() - (1.0 - spread)).abs() < 1e-4);

        let weighted = 0.4 * result.model_scores["random_forest"]
            + 0.4 * result.model_scores["xgboost"]
            + 0.2 * result.model_scores["neural_net"];
        assert!((result.fraud_probability.value() - weighted).abs() <= 5e-5);
    }

    #[test]
    fn test_preload_surfaces_missing_artifacts() {
        let (_dir, store) = empty_artifact_store();
        let engine = FraudEngine::new(EnsembleConfig::default(), Arc::new(store)).unwrap();
        assert!(matches!(engine.preload(), Err(FraudError::ModelLoad(_))));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ensemble_output_bounded(claim in model_claim_strategy()) {
        thread_local! {
            static ENGINE: (TrainedArtifacts, FraudEngine) = {
                let artifacts = TrainedArtifacts::fast();
                let engine = FraudEngine::new(
                    TrainingFixtures::fast_config(),
                    Arc::new(artifacts.store.clone()),
                )
                .unwrap();
                (artifacts, engine)
            };
        }
        ENGINE.with(|(_, engine)| {
            let result = engine.score_ensemble(&claim).unwrap();
            assert_probability_bounds(&result);
            assert_risk_consistent(&result, &RiskPolicy::ENSEMBLE);
            for p in result.model_scores.values() {
                assert!((0.0..=1.0).contains(p));
            }
        });
    }
}
