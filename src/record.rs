//! Job-posting records, the HTTP request/response shapes, and the feature
//! frame handed to the feature pipeline.

use crate::error::{PredictorError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Deserializer, Serialize};

/// Tabular columns passed through unchanged, in frame order.
pub const TABULAR_COLUMNS: [&str; 4] = [
    "remote_allowed",
    "work_type_CONTRACT",
    "work_type_FULL_TIME",
    "work_type_PART_TIME",
];

/// Text columns concatenated into the augmented description, in order.
pub const TEXT_COLUMNS: [&str; 3] = ["company_name", "title", "description"];

/// One job posting, with or without a known salary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub remote_allowed: f64,
    pub work_type_contract: bool,
    pub work_type_full_time: bool,
    pub work_type_part_time: bool,
    /// Location code routed through the frequency encoder
    pub state: String,
    pub company_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl JobPosting {
    /// Pass-through features in [`TABULAR_COLUMNS`] order
    pub fn tabular_features(&self) -> [f64; 4] {
        [
            self.remote_allowed,
            flag(self.work_type_contract),
            flag(self.work_type_full_time),
            flag(self.work_type_part_time),
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Accepts `true`/`false` as well as integers
    #[serde(deserialize_with = "bool_or_int")]
    pub remote_allowed: i64,
    pub work_type_contract: bool,
    pub work_type_full_time: bool,
    pub work_type_part_time: bool,
    pub state: String,
    pub company_name: String,
    pub title: String,
    pub description: String,
}

impl PredictionRequest {
    /// The reference request used by the smoke check and the end-to-end tests.
    pub fn example() -> Self {
        Self {
            remote_allowed: 1,
            work_type_contract: false,
            work_type_full_time: true,
            work_type_part_time: false,
            state: "CA".to_string(),
            company_name: "TechCorp".to_string(),
            title: "Data Analyst".to_string(),
            description: "Analyze data and create reports".to_string(),
        }
    }
}

impl From<PredictionRequest> for JobPosting {
    fn from(req: PredictionRequest) -> Self {
        Self {
            remote_allowed: req.remote_allowed as f64,
            work_type_contract: req.work_type_contract,
            work_type_full_time: req.work_type_full_time,
            work_type_part_time: req.work_type_part_time,
            state: req.state,
            company_name: Some(req.company_name),
            title: Some(req.title),
            description: Some(req.description),
        }
    }
}

/// Body returned by `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub salary: f64,
}

fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(i64::from(b)),
        Flag::Int(i) => Ok(i),
        // 1.0 is accepted, 1.5 is not
        Flag::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        Flag::Float(v) => Err(serde::de::Error::custom(format!(
            "expected a boolean or whole number, got {v}"
        ))),
    }
}

/// Row-aligned model input: one categorical column plus numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub categorical_name: String,
    pub categorical: Vec<String>,
    pub numeric_names: Vec<String>,
    pub numeric: Array2<f64>,
}

impl FeatureFrame {
    pub fn new(
        categorical_name: impl Into<String>,
        categorical: Vec<String>,
        numeric_names: Vec<String>,
        numeric: Array2<f64>,
    ) -> Result<Self> {
        if categorical.len() != numeric.nrows() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} categorical values", numeric.nrows()),
                actual: format!("{} categorical values", categorical.len()),
            });
        }
        if numeric_names.len() != numeric.ncols() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} numeric column names", numeric.ncols()),
                actual: format!("{} numeric column names", numeric_names.len()),
            });
        }
        Ok(Self {
            categorical_name: categorical_name.into(),
            categorical,
            numeric_names,
            numeric,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categorical.is_empty()
    }

    /// Rows at `indices`, in the order given
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            categorical_name: self.categorical_name.clone(),
            categorical: indices.iter().map(|&i| self.categorical[i].clone()).collect(),
            numeric_names: self.numeric_names.clone(),
            numeric: self.numeric.select(Axis(0), indices),
        }
    }
}
