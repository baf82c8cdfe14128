//! Feature pipeline: posting text and tabular fields in, salary out.
//!
//! [`FeatureBuilder`] turns raw postings into a [`FeatureFrame`] (text
//! normalization + embedding, concatenated to the tabular columns, row order
//! preserved). [`FeaturePipeline`] is the fitted chain
//! frequency-encode -> passthrough -> PCA -> regressor behind one
//! `fit` / `transform` / `predict` surface, persisted as a single object.

use crate::embedding::{embed_matrix, embedding_column_names, Embedder};
use crate::error::{PredictorError, Result};
use crate::preprocessing::{ColumnTransformer, Pca, PcaConfig, TextNormalizer};
use crate::record::{FeatureFrame, JobPosting, TABULAR_COLUMNS};
use crate::training::HistGradientBoostingRegressor;
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `predict(features) -> scalar` capability of the final stage
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Builds row-aligned feature frames from postings
#[derive(Clone)]
pub struct FeatureBuilder {
    normalizer: TextNormalizer,
    embedder: Arc<dyn Embedder>,
    categorical_column: String,
}

impl FeatureBuilder {
    pub fn new(
        normalizer: TextNormalizer,
        embedder: Arc<dyn Embedder>,
        categorical_column: impl Into<String>,
    ) -> Self {
        Self {
            normalizer,
            embedder,
            categorical_column: categorical_column.into(),
        }
    }

    pub fn build(&self, postings: &[JobPosting]) -> Result<FeatureFrame> {
        let texts = self.normalizer.normalize_batch(postings);
        let embeddings = embed_matrix(self.embedder.as_ref(), &texts)?;

        let tabular = Array2::from_shape_fn((postings.len(), TABULAR_COLUMNS.len()), |(i, j)| {
            postings[i].tabular_features()[j]
        });
        let numeric = concatenate(Axis(1), &[tabular.view(), embeddings.view()])?;

        let mut names: Vec<String> = TABULAR_COLUMNS.iter().map(|s| s.to_string()).collect();
        names.extend(embedding_column_names(self.embedder.dimension()));

        FeatureFrame::new(
            self.categorical_column.clone(),
            postings.iter().map(|p| p.state.clone()).collect(),
            names,
            numeric,
        )
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline<M = HistGradientBoostingRegressor> {
    columns: ColumnTransformer,
    pca: Pca,
    model: M,
    fitted: bool,
}

impl<M: Regressor> FeaturePipeline<M> {
    pub fn new(pca: PcaConfig, model: M) -> Self {
        Self {
            columns: ColumnTransformer::new(),
            pca: Pca::new(pca),
            model,
            fitted: false,
        }
    }

    /// Fit every stage on the training partition only
    pub fn fit(&mut self, frame: &FeatureFrame, y: &Array1<f64>) -> Result<&mut Self> {
        if frame.n_rows() != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} targets", frame.n_rows()),
                actual: format!("{} targets", y.len()),
            });
        }
        let encoded = self.columns.fit_transform(frame)?;
        let reduced = self.pca.fit_transform(&encoded)?;
        self.model.fit(&reduced, y)?;
        self.fitted = true;
        Ok(self)
    }

    /// Frame -> model input (encoded, PCA-projected)
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(PredictorError::ModelNotFitted);
        }
        let encoded = self.columns.transform(frame)?;
        self.pca.transform(&encoded)
    }

    pub fn predict(&self, frame: &FeatureFrame) -> Result<Array1<f64>> {
        let reduced = self.transform(frame)?;
        self.model.predict(&reduced)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn columns(&self) -> &ColumnTransformer {
        &self.columns
    }

    pub fn pca(&self) -> &Pca {
        &self.pca
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}
