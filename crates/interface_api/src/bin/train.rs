//! Fraud Detection - Offline Training Driver
//!
//! Generates a synthetic claim set, trains the three ensemble models with
//! cross-validation, evaluates them and writes the artifacts the API server
//! loads.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin fraud-train
//!
//! TRAIN_SAMPLES=50000 TRAIN_MODEL_DIR=/var/lib/fraud/models cargo run --release --bin fraud-train
//! ```
//!
//! # Environment Variables
//!
//! * `TRAIN_MODEL_DIR` - Output directory (default: models)
//! * `TRAIN_SAMPLES` - Synthetic claims to generate (default: 12000)
//! * `TRAIN_SEED` - Seed for data generation (default: 42)
//! * `TRAIN_FOLDS` - Cross-validation folds (default: 5)
//! * `TRAIN_LOG_LEVEL` - Log level (default: info)

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_fraud::{generate_synthetic_claims, ArtifactStore, EnsembleConfig, EnsembleTrainer};
use interface_api::config::TrainConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = TrainConfig::from_env().context("invalid TRAIN_* configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    tracing::info!(samples = config.samples, seed = config.seed, "Generating synthetic claims");
    let data = generate_synthetic_claims(config.samples, config.seed)?;
    tracing::info!(
        samples = data.len(),
        fraud_rate = %format!("{:.2}%", data.fraud_rate() * 100.0),
        "Synthetic dataset created"
    );

    let ensemble_config = EnsembleConfig {
        cv_folds: config.folds,
        ..EnsembleConfig::default()
    };
    let store = ArtifactStore::new(config.model_dir.clone());
    let trainer = EnsembleTrainer::new(ensemble_config, Arc::new(store)).context("invalid ensemble configuration")?;

    let (ensemble, report) = trainer.train_and_persist(&data).context("training failed")?;

    for model in &report.models {
        println!(
            "{:<15} CV AUC {:.4} (+/- {:.4})  fit {} ms",
            model.variant.artifact_name(), model.cv_auc_mean, model.cv_auc_std * 2.0, model.fit_duration_ms
        );
    }

    // evaluated on the training set
    for evaluation in ensemble.evaluate(&data)? {
        println!("\n{evaluation}");
    }

    println!(
        "\nModels from run {} saved in {}",
        report.run_id,
        config.model_dir.display()
    );
    Ok(())
}
