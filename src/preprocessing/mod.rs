//! Data preprocessing module
//!
//! - Frequency encoding of the location column
//! - Text normalization ahead of the embedding stage
//! - PCA projection
//! - Column routing (encoded categorical + numeric passthrough)

pub mod column_transformer;
pub mod frequency;
pub mod pca;
pub mod text;

pub use column_transformer::ColumnTransformer;
pub use frequency::{FrequencyEncoder, FrequencyMap, UNSEEN_FREQUENCY};
pub use pca::{Pca, PcaConfig};
pub use text::{StopWords, TextNormalizer, MISSING_TEXT_PLACEHOLDER};
