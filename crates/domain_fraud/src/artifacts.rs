//! File-backed model artifacts
//!
//! Every fitted component is written to `<dir>/<name>.json` inside a small
//! versioned envelope. Names are fixed per component: `random_forest`,
//! `xgboost`, `neural_net` and `scaler`. The training report sits beside them
//! as `training_report.json`.
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never sees a half-written artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use core_kernel::ModelRunId;

use crate::ensemble::TrainedEnsemble;
use crate::error::FraudError;
use crate::models::ModelVariant;
use crate::ports::ModelRepository;
use crate::scaler::StandardScaler;
use crate::training::TrainingReport;

/// Envelope layout version; bumped on incompatible payload changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const SCALER_ARTIFACT: &str = "scaler";
pub const REPORT_FILE: &str = "training_report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u32,
    pub name: String,
    pub run_id: ModelRunId,
    pub trained_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Directory of persisted artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Logical names of every artifact a complete set contains
    pub fn artifact_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = ModelVariant::ALL.iter().map(|v| v.artifact_name()).collect();
        names.push(SCALER_ARTIFACT);
        names
    }

    /// True when every artifact file is present
    pub fn is_complete(&self) -> bool {
        Self::artifact_names()
            .into_iter()
            .all(|name| self.artifact_path(name).is_file())
    }

    pub fn read_report(&self) -> Result<TrainingReport, FraudError> {
        let path = self.dir.join(REPORT_FILE);
        let file = File::open(&path)
            .map_err(|e| FraudError::Persistence(format!("cannot open {}: {e}", path.display())))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn read_envelope(&self, name: &str) -> Result<ArtifactEnvelope, FraudError> {
        let path = self.artifact_path(name);
        let file = File::open(&path).map_err(|e| {
            FraudError::model_load(format!("artifact '{name}' unavailable at {}: {e}", path.display()))
        })?;
        let envelope: ArtifactEnvelope = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| FraudError::model_load(format!("artifact '{name}' is corrupt: {e}")))?;

        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(FraudError::model_load(format!(
                "artifact '{name}' has format version {}, expected {ARTIFACT_FORMAT_VERSION}",
                envelope.format_version
            )));
        }
        if envelope.name != name {
            return Err(FraudError::model_load(format!(
                "artifact file '{name}' holds '{}'",
                envelope.name
            )));
        }
        Ok(envelope)
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<(), FraudError> {
        let path = self.dir.join(file_name);
        let tmp = self.dir.join(format!("{file_name}.tmp"));
        let persist = |e: std::io::Error| FraudError::Persistence(format!("cannot write {}: {e}", path.display()));

        let file = File::create(&tmp).map_err(persist)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(persist)?;
        drop(writer);
        fs::rename(&tmp, &path).map_err(persist)?;

        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    fn write_envelope(&self, name: &str, ensemble: &TrainedEnsemble, payload: serde_json::Value) -> Result<(), FraudError> {
        let envelope = ArtifactEnvelope {
            format_version: ARTIFACT_FORMAT_VERSION,
            name: name.to_string(),
            run_id: ensemble.run_id(),
            trained_at: ensemble.trained_at(),
            payload,
        };
        self.write_json(&format!("{name}.json"), &envelope)
    }
}

impl ModelRepository for ArtifactStore {
    fn load(&self) -> Result<TrainedEnsemble, FraudError> {
        let scaler_envelope = self.read_envelope(SCALER_ARTIFACT)?;
        let run_id = scaler_envelope.run_id;
        let trained_at = scaler_envelope.trained_at;
        let scaler: StandardScaler = serde_json::from_value(scaler_envelope.payload)
            .map_err(|e| FraudError::model_load(format!("scaler payload is corrupt: {e}")))?;

        let mut models = Vec::with_capacity(ModelVariant::ALL.len());
        for variant in ModelVariant::ALL {
            let envelope = self.read_envelope(variant.artifact_name())?;
            if envelope.run_id != run_id {
                return Err(FraudError::model_load(format!(
                    "artifact '{variant}' belongs to run {}, scaler to run {run_id}",
                    envelope.run_id
                )));
            }
            let model = variant.load_payload(envelope.payload).map_err(|e| match e {
                FraudError::ModelLoad(_) => e,
                other => FraudError::model_load(format!("artifact '{variant}' payload is corrupt: {other}")),
            })?;
            models.push(model);
        }

        let ensemble = TrainedEnsemble::new(scaler, models, run_id, trained_at)?;
        info!(dir = %self.dir.display(), %run_id, "Model artifacts loaded");
        Ok(ensemble)
    }

    fn save(&self, ensemble: &TrainedEnsemble, report: &TrainingReport) -> Result<(), FraudError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| FraudError::Persistence(format!("cannot create {}: {e}", self.dir.display())))?;

        for model in ensemble.models() {
            self.write_envelope(model.variant().artifact_name(), ensemble, model.to_payload()?)?;
        }
        self.write_envelope(SCALER_ARTIFACT, ensemble, serde_json::to_value(ensemble.scaler())?)?;
        self.write_json(REPORT_FILE, report)?;

        info!(dir = %self.dir.display(), run_id = %ensemble.run_id(), "Model artifacts saved");
        Ok(())
    }
}
