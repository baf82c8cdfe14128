//! Search space definition for hyperparameters

use crate::error::{PredictorError, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    /// Continuous float parameter, `high` exclusive
    Float { low: f64, high: f64, log_scale: bool },
    /// Integer parameter, both bounds inclusive
    Int { low: i64, high: i64 },
}

/// A single hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
}

impl Parameter {
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float { low, high, log_scale: false },
        }
    }

    /// Log-uniform float, like `loguniform(low, high)`
    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float { low, high, log_scale: true },
        }
    }

    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Int { low, high },
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match self.param_type {
            ParameterType::Float { low, high, log_scale } => low < high && (!log_scale || low > 0.0),
            ParameterType::Int { low, high } => low <= high,
        };
        if ok {
            Ok(())
        } else {
            Err(PredictorError::InvalidParameter {
                name: self.name.clone(),
                value: format!("{:?}", self.param_type),
                reason: "empty or invalid range".to_string(),
            })
        }
    }

    /// Sample a random value
    pub fn sample(&self, rng: &mut impl Rng) -> ParameterValue {
        match self.param_type {
            ParameterType::Float { low, high, log_scale } => {
                let val = if log_scale {
                    let (log_low, log_high) = (low.ln(), high.ln());
                    (rng.gen::<f64>() * (log_high - log_low) + log_low).exp()
                } else {
                    rng.gen::<f64>() * (high - low) + low
                };
                ParameterValue::Float(val)
            }
            ParameterType::Int { low, high } => ParameterValue::Int(rng.gen_range(low..=high)),
        }
    }
}

/// Sampled parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
}

impl ParameterValue {
    pub fn as_float(&self) -> f64 {
        match *self {
            ParameterValue::Float(v) => v,
            ParameterValue::Int(v) => v as f64,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            ParameterValue::Int(v) => Some(v),
            ParameterValue::Float(_) => None,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{v:.6}"),
            ParameterValue::Int(v) => write!(f, "{v}"),
        }
    }
}

/// Sampled configuration, ordered by name
pub type TrialParams = BTreeMap<String, ParameterValue>;

/// Search space for hyperparameter optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self { parameters: Vec::new() }
    }

    /// PCA width, learning rate, boosting rounds, leaf count and leaf size
    /// for the salary pipeline.
    pub fn salary_default() -> Self {
        Self::new()
            .int("n_components", 100, 249)
            .log_float("learning_rate", 1e-3, 1.0)
            .int("max_iter", 110, 199)
            .int("max_leaf_nodes", 90, 249)
            .int("min_samples_leaf", 20, 69)
    }

    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float(name, low, high))
    }

    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_float(name, low, high))
    }

    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int(name, low, high))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn validate(&self) -> Result<()> {
        self.parameters.iter().try_for_each(Parameter::validate)
    }

    /// Sample one configuration; parameters are drawn in declaration order
    pub fn sample(&self, rng: &mut impl Rng) -> TrialParams {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.sample(rng)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::salary_default()
    }
}
