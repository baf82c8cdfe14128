//! Model export
//!
//! Persists the fitted pipeline and its training metadata as one file.

mod artifact;

pub use artifact::{sha256_file, PipelineArtifact, ARTIFACT_FORMAT_VERSION};
