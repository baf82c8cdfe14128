//! Sentence embedding stage
//!
//! Maps cleaned posting text to fixed-width dense vectors. Two backends:
//! - [`HashingEmbedder`]: deterministic signed feature hashing, no downloads
//! - `MiniLmEmbedder`: pre-trained all-MiniLM-L6-v2 via candle
//!   (feature `sentence-embeddings`)

mod hashing;
#[cfg(feature = "sentence-embeddings")]
mod sentence;

pub use hashing::HashingEmbedder;
#[cfg(feature = "sentence-embeddings")]
pub use sentence::MiniLmEmbedder;

use crate::error::{PredictorError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Width of all-MiniLM-L6-v2 sentence vectors
pub const MINILM_DIMENSION: usize = 384;

pub const MINILM_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Text -> vector encoder shared across threads
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    /// One vector per input text, in input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Which embedder produced the vectors a pipeline was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedderKind {
    Hashing { dimension: usize },
    MiniLm { model_id: String },
}

impl EmbedderKind {
    pub fn dimension(&self) -> usize {
        match self {
            EmbedderKind::Hashing { dimension } => *dimension,
            EmbedderKind::MiniLm { .. } => MINILM_DIMENSION,
        }
    }

    pub fn build(&self) -> Result<Arc<dyn Embedder>> {
        match self {
            EmbedderKind::Hashing { dimension } => Ok(Arc::new(HashingEmbedder::new(*dimension)?)),
            #[cfg(feature = "sentence-embeddings")]
            EmbedderKind::MiniLm { model_id } => Ok(Arc::new(MiniLmEmbedder::load(model_id)?)),
            #[cfg(not(feature = "sentence-embeddings"))]
            EmbedderKind::MiniLm { model_id } => Err(PredictorError::ConfigError(format!(
                "embedder '{model_id}' requires the `sentence-embeddings` feature"
            ))),
        }
    }
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "sentence-embeddings") {
            EmbedderKind::MiniLm {
                model_id: MINILM_MODEL_ID.to_string(),
            }
        } else {
            EmbedderKind::Hashing {
                dimension: MINILM_DIMENSION,
            }
        }
    }
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedderKind::Hashing { dimension } => write!(f, "hashing-{dimension}"),
            EmbedderKind::MiniLm { model_id } => write!(f, "minilm ({model_id})"),
        }
    }
}

impl FromStr for EmbedderKind {
    type Err = PredictorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hashing" | "hash" => Ok(EmbedderKind::Hashing {
                dimension: MINILM_DIMENSION,
            }),
            "minilm" | "all-minilm-l6-v2" => Ok(EmbedderKind::MiniLm {
                model_id: MINILM_MODEL_ID.to_string(),
            }),
            other => Err(PredictorError::ConfigError(format!(
                "unknown embedder '{other}' (expected 'hashing' or 'minilm')"
            ))),
        }
    }
}

/// Column names of the embedding block: "0", "1", ...
pub fn embedding_column_names(dimension: usize) -> Vec<String> {
    (0..dimension).map(|i| i.to_string()).collect()
}

/// Embed `texts` and check the result is one full-width row per input.
pub fn embed_matrix(embedder: &dyn Embedder, texts: &[String]) -> Result<Array2<f64>> {
    let dim = embedder.dimension();
    let vectors = embedder.embed_batch(texts)?;
    if vectors.len() != texts.len() {
        return Err(PredictorError::EmbeddingError(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }

    let mut out = Array2::zeros((texts.len(), dim));
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(PredictorError::EmbeddingError(format!(
                "vector {i} has width {}, expected {dim}",
                v.len()
            )));
        }
        for (j, &x) in v.iter().enumerate() {
            out[[i, j]] = f64::from(x);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn dimension(&self) -> usize {
            4
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![0.0; 4]).collect())
        }
    }

    #[test]
    fn test_row_count_mismatch_is_an_error() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embed_matrix(&ShortEmbedder, &texts).unwrap_err();
        assert!(matches!(err, PredictorError::EmbeddingError(_)));
    }

    #[test]
    fn test_embed_matrix_shape() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let texts = vec!["data analyst".to_string(), "".to_string()];
        let m = embed_matrix(&embedder, &texts).unwrap();
        assert_eq!(m.dim(), (2, 16));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            "hashing".parse::<EmbedderKind>().unwrap(),
            EmbedderKind::Hashing { dimension: 384 }
        );
        assert!("word2vec".parse::<EmbedderKind>().is_err());
        assert_eq!(embedding_column_names(3), vec!["0", "1", "2"]);
    }

    #[cfg(not(feature = "sentence-embeddings"))]
    #[test]
    fn test_minilm_requires_feature() {
        let kind = EmbedderKind::MiniLm {
            model_id: MINILM_MODEL_ID.to_string(),
        };
        assert!(matches!(kind.build(), Err(PredictorError::ConfigError(_))));
    }
}
