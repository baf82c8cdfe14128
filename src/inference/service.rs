//! Prediction service over one loaded artifact

use crate::embedding::Embedder;
use crate::error::{PredictorError, Result};
use crate::export::PipelineArtifact;
use crate::pipeline::FeatureBuilder;
use crate::preprocessing::{StopWords, TextNormalizer};
use crate::record::{JobPosting, PredictionRequest};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Inference statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStats {
    pub total_predictions: u64,
    pub failed_predictions: u64,
    pub stop_words_loaded: bool,
}

/// Read-only fitted pipeline plus the embedder it was trained with.
///
/// Stop words are read on the first prediction and cached; a failed read
/// fails that prediction only and is retried on the next one.
pub struct PredictionService {
    artifact: PipelineArtifact,
    embedder: Arc<dyn Embedder>,
    stop_words_path: PathBuf,
    normalizer: RwLock<Option<TextNormalizer>>,
    total_predictions: AtomicU64,
    failed_predictions: AtomicU64,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("embedder", &self.artifact.embedder)
            .field("stop_words_path", &self.stop_words_path)
            .field("total_predictions", &self.total_predictions.load(Ordering::Relaxed))
            .finish()
    }
}

impl PredictionService {
    pub fn new(
        artifact: PipelineArtifact,
        embedder: Arc<dyn Embedder>,
        stop_words_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            artifact,
            embedder,
            stop_words_path: stop_words_path.into(),
            normalizer: RwLock::new(None),
            total_predictions: AtomicU64::new(0),
            failed_predictions: AtomicU64::new(0),
        }
    }

    /// Load the artifact and rebuild its embedder. A missing artifact is
    /// [`PredictorError::ArtifactNotFound`].
    pub fn load(model_path: impl AsRef<Path>, stop_words_path: impl Into<PathBuf>) -> Result<Self> {
        let start = Instant::now();
        let artifact = PipelineArtifact::load(model_path.as_ref())?;
        let embedder = artifact.embedder.build()?;
        if embedder.dimension() != artifact.embedder.dimension() {
            return Err(PredictorError::EmbeddingError(format!(
                "embedder width {} does not match the trained width {}",
                embedder.dimension(),
                artifact.embedder.dimension()
            )));
        }
        tracing::info!(
            path = %model_path.as_ref().display(),
            embedder = %artifact.embedder,
            test_rmse = artifact.test_rmse,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded prediction pipeline"
        );
        Ok(Self::new(artifact, embedder, stop_words_path))
    }

    fn normalizer(&self) -> Result<TextNormalizer> {
        if let Some(normalizer) = self.normalizer.read().as_ref() {
            return Ok(normalizer.clone());
        }

        let stop_words = StopWords::load(&self.stop_words_path)?;
        tracing::info!(
            path = %self.stop_words_path.display(),
            words = stop_words.len(),
            "Loaded stop words"
        );
        let normalizer = TextNormalizer::new(Arc::new(stop_words))?;

        let mut slot = self.normalizer.write();
        Ok(slot.get_or_insert(normalizer).clone())
    }

    pub fn predict_postings(&self, postings: &[JobPosting]) -> Result<Vec<f64>> {
        let result = self.normalizer().and_then(|normalizer| {
            let builder = FeatureBuilder::new(
                normalizer,
                Arc::clone(&self.embedder),
                self.artifact.categorical_column.clone(),
            );
            let frame = builder.build(postings)?;
            Ok(self.artifact.pipeline.predict(&frame)?.to_vec())
        });

        match &result {
            Ok(preds) => {
                self.total_predictions.fetch_add(preds.len() as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed_predictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    pub fn predict(&self, request: PredictionRequest) -> Result<f64> {
        let posting: JobPosting = request.into();
        let preds = self.predict_postings(std::slice::from_ref(&posting))?;
        preds
            .first()
            .copied()
            .ok_or_else(|| PredictorError::ValidationError("pipeline returned no prediction".into()))
    }

    pub fn artifact(&self) -> &PipelineArtifact {
        &self.artifact
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_predictions: self.total_predictions.load(Ordering::Relaxed),
            failed_predictions: self.failed_predictions.load(Ordering::Relaxed),
            stop_words_loaded: self.normalizer.read().is_some(),
        }
    }
}
