//! Model Repository Test Doubles
//!
//! Provides repositories that count and delay loads, plus a helper that
//! trains a small ensemble into a temporary artifact directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use domain_fraud::{
    train_ensemble, ArtifactStore, EnsembleConfig, FraudError, LabeledClaims, ModelRepository,
    TrainedEnsemble, TrainingReport,
};
use tempfile::TempDir;

use crate::fixtures::TrainingFixtures;

/// Wraps a repository, counting calls and optionally slowing loads down
pub struct CountingRepository<R> {
    inner: R,
    loads: AtomicUsize,
    saves: AtomicUsize,
    load_delay: Duration,
}

impl<R: ModelRepository> CountingRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            load_delay: Duration::ZERO,
        }
    }

    /// Sleeps this long inside every load, widening race windows
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<R: ModelRepository> ModelRepository for CountingRepository<R> {
    fn load(&self) -> Result<TrainedEnsemble, FraudError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }
        self.inner.load()
    }

    fn save(&self, ensemble: &TrainedEnsemble, report: &TrainingReport) -> Result<(), FraudError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(ensemble, report)
    }
}

/// A trained model set persisted in a temporary directory
pub struct TrainedArtifacts {
    /// Kept alive so the directory outlives the test
    pub dir: TempDir,
    pub store: ArtifactStore,
    pub report: TrainingReport,
}

impl TrainedArtifacts {
    /// Trains the fast configuration on the small fixture dataset
    pub fn fast() -> Self {
        Self::train(&TrainingFixtures::small_dataset(), &TrainingFixtures::fast_config())
    }

    pub fn train(data: &LabeledClaims, config: &EnsembleConfig) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = ArtifactStore::new(dir.path());
        let (ensemble, report) = train_ensemble(data, config).expect("training");
        store.save(&ensemble, &report).expect("saving artifacts");
        Self { dir, store, report }
    }

    /// Edits the payload of one persisted artifact in place
    pub fn edit_payload(&self, name: &str, edit: impl FnOnce(&mut serde_json::Value)) {
        let path = self.store.artifact_path(name);
        let text = std::fs::read_to_string(&path).expect("reading artifact");
        let mut envelope: serde_json::Value = serde_json::from_str(&text).expect("artifact json");
        edit(&mut envelope["payload"]);
        std::fs::write(&path, envelope.to_string()).expect("writing artifact");
    }
}

/// An artifact store pointing at an empty temporary directory
pub fn empty_artifact_store() -> (TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}
