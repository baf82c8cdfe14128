//! Inference
//!
//! Serves predictions from one immutable, loaded pipeline artifact.

mod service;

pub use service::{InferenceStats, PredictionService};
