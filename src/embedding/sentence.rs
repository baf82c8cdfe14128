//! all-MiniLM-L6-v2 sentence embeddings on candle.
//!
//! Weights, config and tokenizer are fetched through the Hugging Face hub
//! cache. Vectors are attention-masked mean pools of the last hidden state,
//! L2-normalized.

use super::{Embedder, MINILM_DIMENSION};
use crate::error::{PredictorError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

const MAX_SEQUENCE_LENGTH: usize = 256;
const BATCH_SIZE: usize = 64;

pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

fn embedding_err(e: impl std::fmt::Display) -> PredictorError {
    PredictorError::EmbeddingError(e.to_string())
}

impl MiniLmEmbedder {
    pub fn load(model_id: &str) -> Result<Self> {
        tracing::info!(model = %model_id, "Loading sentence embedding model");
        let device = Device::Cpu;

        let api = Api::new().map_err(embedding_err)?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));
        let config_path = repo.get("config.json").map_err(embedding_err)?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(embedding_err)?;
        let weights_path = repo.get("model.safetensors").map_err(embedding_err)?;

        let config: Config = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(embedding_err)?;
        tokenizer.with_padding(Some(PaddingParams::default()));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(embedding_err)?;

        // SAFETY: the safetensors file is owned by the hub cache and not mutated while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(embedding_err)?
        };
        let model = BertModel::load(vb, &config).map_err(embedding_err)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(embedding_err)?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(embedding_err)?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(embedding_err)?;

        let pooled = (|| -> candle_core::Result<Tensor> {
            let input_ids = Tensor::stack(&ids, 0)?;
            let attention_mask = Tensor::stack(&masks, 0)?;
            let token_type_ids = input_ids.zeros_like()?;
            let hidden = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

            let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
            let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
            let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
            let mean = summed.broadcast_div(&counts)?;
            let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
            mean.broadcast_div(&norm)
        })()
        .map_err(embedding_err)?;

        pooled.to_vec2::<f32>().map_err(embedding_err)
    }
}

impl Embedder for MiniLmEmbedder {
    fn dimension(&self) -> usize {
        MINILM_DIMENSION
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MINILM_MODEL_ID;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    #[ignore = "downloads all-MiniLM-L6-v2 from the Hugging Face hub"]
    fn test_minilm_unit_vectors_in_input_order() {
        let embedder = MiniLmEmbedder::load(MINILM_MODEL_ID).unwrap();
        let texts = vec![
            "data analyst reports".to_string(),
            String::new(),
            "software engineer backend services".to_string(),
        ];
        let out = embedder.embed_batch(&texts).unwrap();

        assert_eq!(out.len(), texts.len());
        for v in &out {
            assert_eq!(v.len(), MINILM_DIMENSION);
            assert!((norm(v) - 1.0).abs() < 1e-4);
        }
        assert_ne!(out[0], out[2]);

        // each row belongs to the input at the same position
        for (i, text) in texts.iter().enumerate() {
            let single = embedder.embed_batch(std::slice::from_ref(text)).unwrap();
            let diff: f32 = single[0]
                .iter()
                .zip(&out[i])
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max);
            assert!(diff < 1e-3, "row {i} differs by {diff}");
        }
    }
}
