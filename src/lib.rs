//! Salary predictor
//!
//! Predicts the salary of a job posting from a few tabular fields, its
//! location code and an embedding of its text, and serves the fitted model
//! over HTTP.
//!
//! # Modules
//!
//! ## Feature pipeline
//! - [`record`] - Job postings, request/response shapes, feature frames
//! - [`preprocessing`] - Frequency encoding, text normalization, PCA
//! - [`embedding`] - Text embedders (feature hashing, MiniLM)
//! - [`pipeline`] - Feature builder and the fitted fit/transform/predict chain
//!
//! ## Training
//! - [`training`] - Gradient-boosted trees, splits, metrics, training driver
//! - [`optimizer`] - Randomized hyperparameter search with k-fold CV
//! - [`export`] - Single-file model artifact
//!
//! ## Services
//! - [`inference`] - Prediction service over a loaded artifact
//! - [`server`] - HTTP server with the prediction endpoint and form UI
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`utils`] - CSV dataset loading

// Core error handling
pub mod error;

// Feature pipeline
pub mod record;
pub mod preprocessing;
pub mod embedding;
pub mod pipeline;

// Training
pub mod training;
pub mod optimizer;
pub mod export;

// Services
pub mod inference;
pub mod server;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{PredictorError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PredictorError, Result};

    // Records
    pub use crate::record::{FeatureFrame, JobPosting, PredictionRequest, PredictionResponse};

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnTransformer, FrequencyEncoder, FrequencyMap, Pca, PcaConfig, StopWords, TextNormalizer,
    };

    // Embedding
    pub use crate::embedding::{Embedder, EmbedderKind, HashingEmbedder};

    // Pipeline
    pub use crate::pipeline::{FeatureBuilder, FeaturePipeline, Regressor};

    // Training
    pub use crate::training::{
        CachePolicy, HgbrConfig, HistGradientBoostingRegressor, KFold, TrainingConfig,
        TrainingDriver, TrainingOutcome, TrainingReport,
    };

    // Optimization
    pub use crate::optimizer::{PipelineParams, RandomizedSearch, SearchConfig, SearchSpace};

    // Export
    pub use crate::export::PipelineArtifact;

    // Inference
    pub use crate::inference::{InferenceStats, PredictionService};

    // Data loading
    pub use crate::utils::{DataLoader, PostingsDataset};
}
