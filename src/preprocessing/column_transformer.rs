//! Routes the categorical column through the frequency encoder and passes
//! every numeric column through unchanged.
//!
//! Output layout: the encoded categorical column first, then the numeric
//! columns in frame order. Output names are the bare input names.

use super::frequency::FrequencyEncoder;
use crate::error::{PredictorError, Result};
use crate::record::FeatureFrame;
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    encoder: FrequencyEncoder,
    categorical_name: Option<String>,
    passthrough: Vec<String>,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self {
            encoder: FrequencyEncoder::new(),
            categorical_name: None,
            passthrough: Vec::new(),
        }
    }

    pub fn fit(&mut self, frame: &FeatureFrame) -> Result<&mut Self> {
        self.encoder.fit(&frame.categorical)?;
        self.categorical_name = Some(frame.categorical_name.clone());
        self.passthrough = frame.numeric_names.clone();
        Ok(self)
    }

    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        let expected = self
            .categorical_name
            .as_ref()
            .ok_or(PredictorError::ModelNotFitted)?;
        if &frame.categorical_name != expected {
            return Err(PredictorError::FeatureNotFound(expected.clone()));
        }
        if frame.numeric_names != self.passthrough {
            return Err(PredictorError::ShapeError {
                expected: format!("{} passthrough columns", self.passthrough.len()),
                actual: format!("{} passthrough columns", frame.numeric_names.len()),
            });
        }

        let encoded = Array1::from(self.encoder.transform(&frame.categorical)?);
        let encoded = encoded.insert_axis(Axis(1));
        Ok(concatenate(Axis(1), &[encoded.view(), frame.numeric.view()])?)
    }

    pub fn fit_transform(&mut self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        self.fit(frame)?;
        self.transform(frame)
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.categorical_name
            .iter()
            .cloned()
            .chain(self.passthrough.iter().cloned())
            .collect()
    }

    pub fn encoder(&self) -> &FrequencyEncoder {
        &self.encoder
    }
}

impl Default for ColumnTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame(states: &[&str], numeric: Array2<f64>) -> FeatureFrame {
        FeatureFrame::new(
            "state",
            states.iter().map(|s| s.to_string()).collect(),
            vec!["remote_allowed".to_string(), "0".to_string()],
            numeric,
        )
        .unwrap()
    }

    #[test]
    fn test_encoded_column_comes_first() {
        let train = frame(&["CA", "NY", "CA"], array![[1.0, 0.1], [0.0, 0.2], [1.0, 0.3]]);
        let mut ct = ColumnTransformer::new();
        let out = ct.fit_transform(&train).unwrap();

        assert_eq!(out.dim(), (3, 3));
        assert_eq!(out.column(0).to_vec(), vec![2.0, 1.0, 2.0]);
        assert_eq!(out.column(2).to_vec(), vec![0.1, 0.2, 0.3]);
        assert_eq!(ct.feature_names_out(), vec!["state", "remote_allowed", "0"]);
    }

    #[test]
    fn test_unseen_state_passes_with_fallback() {
        let train = frame(&["CA", "CA"], array![[1.0, 0.1], [0.0, 0.2]]);
        let mut ct = ColumnTransformer::new();
        ct.fit(&train).unwrap();

        let out = ct.transform(&frame(&["CL"], array![[1.0, 0.5]])).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_rejects_different_columns() {
        let train = frame(&["CA", "CA"], array![[1.0, 0.1], [0.0, 0.2]]);
        let mut ct = ColumnTransformer::new();
        ct.fit(&train).unwrap();

        let other = FeatureFrame::new(
            "state",
            vec!["CA".to_string()],
            vec!["x".to_string()],
            array![[1.0]],
        )
        .unwrap();
        assert!(ct.transform(&other).is_err());
    }
}
