//! Training driver: CSV in, artifact and error report out.

use super::config::{CachePolicy, TrainingConfig};
use super::cross_validation::train_test_split;
use super::metrics::{root_mean_squared_error, RegressionMetrics};
use crate::error::Result;
use crate::export::{sha256_file, PipelineArtifact, ARTIFACT_FORMAT_VERSION};
use crate::optimizer::{PipelineParams, RandomizedSearch};
use crate::pipeline::FeatureBuilder;
use crate::preprocessing::{StopWords, TextNormalizer};
use crate::utils::DataLoader;
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Errors and search summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub test_mae: f64,
    pub test_r2: f64,
    pub cv_score: f64,
    pub best_params: PipelineParams,
    pub n_train: usize,
    pub n_test: usize,
    pub n_candidates: usize,
    pub n_failed: usize,
    pub duration_secs: f64,
}

impl TrainingReport {
    /// Contents of the score file
    pub fn score_text(&self) -> String {
        format_score(self.train_rmse, self.test_rmse)
    }
}

/// `In sample error: <train>` / `Out of sample error:<test>`
pub fn format_score(train_rmse: f64, test_rmse: f64) -> String {
    format!("In sample error: {}\nOut of sample error:{}", train_rmse, test_rmse)
}

#[derive(Debug, Clone)]
pub enum TrainingOutcome {
    /// Nothing was written
    Skipped { reason: String },
    Trained(TrainingReport),
}

pub struct TrainingDriver {
    config: TrainingConfig,
}

impl TrainingDriver {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train unless `policy` says the existing artifact is still good.
    pub fn run(&self, policy: CachePolicy) -> Result<TrainingOutcome> {
        let config = &self.config;
        if let Some(reason) = self.skip_reason(policy)? {
            tracing::info!(model = %config.model_path.display(), %reason, "Skipping training");
            return Ok(TrainingOutcome::Skipped { reason });
        }

        let start = Instant::now();
        let fingerprint = sha256_file(&config.dataset_path)?;
        let dataset = DataLoader::new()
            .with_target_column(&config.target_column)
            .with_categorical_column(&config.categorical_column)
            .load_postings(&config.dataset_path)?;

        let split = train_test_split(dataset.len(), config.test_size, config.random_state)?;
        tracing::info!(
            n_train = split.train_indices.len(),
            n_test = split.test_indices.len(),
            seed = config.random_state,
            "Split dataset"
        );

        let stop_words = Arc::new(StopWords::load(&config.stop_words_path)?);
        let normalizer = TextNormalizer::new(stop_words)?;
        let embedder = config.embedder.build()?;
        let builder = FeatureBuilder::new(normalizer, embedder, config.categorical_column.clone());

        // embed once, then split the frame
        let frame = builder.build(&dataset.postings)?;
        let train = frame.select_rows(&split.train_indices);
        let test = frame.select_rows(&split.test_indices);
        let y_train = dataset.target.select(Axis(0), &split.train_indices);
        let y_test = dataset.target.select(Axis(0), &split.test_indices);

        let search = RandomizedSearch::new(config.search_space.clone(), config.search_config());
        let outcome = search.fit(&train, &y_train)?;

        let train_rmse = root_mean_squared_error(&y_train, &outcome.pipeline.predict(&train)?)?;
        let test_metrics = RegressionMetrics::compute(&y_test, &outcome.pipeline.predict(&test)?)?;
        let test_rmse = test_metrics.rmse;

        let report = TrainingReport {
            train_rmse,
            test_rmse,
            test_mae: test_metrics.mae,
            test_r2: test_metrics.r2,
            cv_score: outcome.best_score,
            best_params: outcome.best_params,
            n_train: y_train.len(),
            n_test: y_test.len(),
            n_candidates: outcome.study.trials.len(),
            n_failed: outcome.study.n_failed(),
            duration_secs: start.elapsed().as_secs_f64(),
        };

        let artifact = PipelineArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: chrono::Utc::now(),
            dataset_sha256: fingerprint,
            target_column: config.target_column.clone(),
            categorical_column: config.categorical_column.clone(),
            embedder: config.embedder.clone(),
            best_params: outcome.best_params,
            cv_score: outcome.best_score,
            train_rmse,
            test_rmse,
            pipeline: outcome.pipeline,
        };
        // score first: an artifact on disk means the run finished
        write_score(&config.score_path, &report.score_text())?;
        if let Err(e) = artifact.save(&config.model_path) {
            let _ = fs::remove_file(&config.model_path);
            let _ = fs::remove_file(&config.score_path);
            return Err(e);
        }

        tracing::info!(
            train_rmse,
            test_rmse,
            test_mae = report.test_mae,
            test_r2 = report.test_r2,
            cv_score = report.cv_score,
            duration_secs = report.duration_secs,
            "Training complete"
        );
        Ok(TrainingOutcome::Trained(report))
    }

    fn skip_reason(&self, policy: CachePolicy) -> Result<Option<String>> {
        let model_path = &self.config.model_path;
        if !model_path.exists() {
            return Ok(None);
        }
        match policy {
            CachePolicy::Overwrite => Ok(None),
            CachePolicy::SkipIfExists => Ok(Some(format!(
                "artifact already exists at {}",
                model_path.display()
            ))),
            CachePolicy::SkipIfUnchanged => {
                let current = sha256_file(&self.config.dataset_path)?;
                match PipelineArtifact::load(model_path) {
                    Ok(artifact) if artifact.dataset_sha256 == current => Ok(Some(format!(
                        "dataset unchanged since last training (sha256 {})",
                        &current[..12]
                    ))),
                    Ok(_) => Ok(None),
                    Err(e) => {
                        tracing::warn!(error = %e, "Existing artifact unreadable, retraining");
                        Ok(None)
                    }
                }
            }
        }
    }
}

fn write_score(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
