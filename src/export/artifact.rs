//! Single-file persistence of the fitted pipeline
//!
//! The artifact bundles the fitted [`FeaturePipeline`] with what is needed
//! to rebuild the serving path (embedder kind, column names) and the
//! training report. Encoded with bincode.

use crate::embedding::EmbedderKind;
use crate::error::{PredictorError, Result};
use crate::optimizer::PipelineParams;
use crate::pipeline::FeaturePipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 of the training CSV
    pub dataset_sha256: String,
    pub target_column: String,
    pub categorical_column: String,
    pub embedder: EmbedderKind,
    pub best_params: PipelineParams,
    /// Mean negative RMSE of the winning candidate
    pub cv_score: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub pipeline: FeaturePipeline,
}

impl PipelineArtifact {
    /// Write to `path`, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self).map_err(|e| {
            PredictorError::SerializationError(format!("Failed to serialize artifact: {}", e))
        })?;

        tracing::info!(path = %path.display(), "Saved pipeline artifact");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PredictorError::ArtifactNotFound(path.to_path_buf()));
        }

        let mut bytes = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
        let artifact: Self = bincode::deserialize(&bytes).map_err(|e| {
            PredictorError::SerializationError(format!("Failed to deserialize artifact: {}", e))
        })?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PredictorError::SerializationError(format!(
                "artifact format version {} is not supported (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        Ok(artifact)
    }
}

/// Hex SHA-256 of a file's bytes
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
