//! Hyperparameter optimization
//!
//! Seeded randomized search over the pipeline's hyperparameters, scored by
//! K-fold cross-validation.

mod random_search;
mod search_space;

pub use random_search::{
    PipelineParams, RandomizedSearch, SearchConfig, SearchOutcome, Study, TrialResult,
};
pub use search_space::{Parameter, ParameterType, ParameterValue, SearchSpace, TrialParams};
