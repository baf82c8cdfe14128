//! Model training module
//!
//! - Histogram gradient boosting regressor
//! - Hold-out split and K-fold cross-validation
//! - Regression metrics
//! - The training driver that ties data loading, search and export together

mod config;
pub mod cross_validation;
pub mod driver;
pub mod hist_gradient_boosting;
pub mod metrics;

pub use config::{CachePolicy, TrainingConfig};
pub use cross_validation::{train_test_split, CVSplit, KFold};
pub use driver::{format_score, TrainingDriver, TrainingOutcome, TrainingReport};
pub use hist_gradient_boosting::{HgbrConfig, HistGradientBoostingRegressor};
pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error, RegressionMetrics};
