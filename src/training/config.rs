//! Training configuration

use crate::embedding::EmbedderKind;
use crate::optimizer::{SearchConfig, SearchSpace};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do when a model artifact already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CachePolicy {
    /// Never retrain over an existing artifact
    #[default]
    SkipIfExists,
    /// Always retrain and replace the artifact
    Overwrite,
    /// Retrain only when the dataset fingerprint differs from the artifact's
    SkipIfUnchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    /// Two-line in/out-of-sample error report
    pub score_path: PathBuf,
    pub stop_words_path: PathBuf,
    pub target_column: String,
    pub categorical_column: String,
    pub test_size: f64,
    pub random_state: u64,
    pub n_iter: usize,
    pub cv_folds: usize,
    pub search_space: SearchSpace,
    pub embedder: EmbedderKind,
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: env_path("DATASET_PATH", "data/postings.csv"),
            model_path: env_path("MODEL_PATH", "models/best_model.bin"),
            score_path: env_path("SCORE_PATH", "out/score.txt"),
            stop_words_path: env_path("STOP_WORDS_PATH", "stop_words.json"),
            target_column: "target".to_string(),
            categorical_column: "state".to_string(),
            test_size: 0.2,
            random_state: 42,
            n_iter: 100,
            cv_folds: 10,
            search_space: SearchSpace::salary_default(),
            embedder: EmbedderKind::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_score_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.score_path = path.into();
        self
    }

    pub fn with_stop_words_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stop_words_path = path.into();
        self
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.search_space = space;
        self
    }

    pub fn with_embedder(mut self, embedder: EmbedderKind) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            n_iter: self.n_iter,
            cv_folds: self.cv_folds,
            random_state: self.random_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = TrainingConfig::new()
            .with_dataset_path("a.csv")
            .with_n_iter(3)
            .with_cv_folds(2)
            .with_random_state(7);
        assert_eq!(config.dataset_path, PathBuf::from("a.csv"));
        assert_eq!(config.search_config().n_iter, 3);
        assert_eq!(config.search_config().cv_folds, 2);
        assert_eq!(config.search_config().random_state, 7);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.target_column, "target");
    }

    #[test]
    fn test_default_cache_policy() {
        assert_eq!(CachePolicy::default(), CachePolicy::SkipIfExists);
    }
}
