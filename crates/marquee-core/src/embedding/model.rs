//! Transformer sentence embedder.
//!
//! [`MiniLmEmbedder`] runs a BERT encoder (the `all-MiniLM-L6-v2` layout by
//! default) with Candle on the CPU and mean-pools token states into one
//! vector per text.

use super::tokenizer::{TokenizedText, TokenizerHandle};
use super::traits::Embedder;
use crate::config::DEFAULT_MODEL_ID;
use crate::error::EmbeddingError;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};

pub const CONFIG_FILENAME: &str = "config.json";
pub const WEIGHTS_FILENAME: &str = "model.safetensors";
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// The subset of `config.json` needed outside candle.
#[derive(Debug, Deserialize)]
struct ModelDims {
    hidden_size: usize,
    max_position_embeddings: usize,
}

/// BERT sentence embedder.
///
/// # Examples
///
/// ```ignore
/// let embedder = MiniLmEmbedder::from_dir("models/all-MiniLM-L6-v2")?;
/// let vector = embedder.embed("A mind-bending heist inside dreams")?;
/// assert_eq!(vector.len(), 384);
/// ```
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: TokenizerHandle,
    model_id: String,
    hidden_size: usize,
    device: Device,
}

impl MiniLmEmbedder {
    /// Loads `config.json`, `model.safetensors` and `tokenizer.json` from
    /// `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, EmbeddingError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read(&path).map_err(|e| {
                EmbeddingError::ModelLoad(format!("Failed to read {}: {}", path.display(), e))
            })
        };

        let config_bytes = read(CONFIG_FILENAME)?;
        let weights = read(WEIGHTS_FILENAME)?;
        let tokenizer_bytes = read(TOKENIZER_FILENAME)?;

        Self::from_bytes(&config_bytes, weights, tokenizer_bytes)
    }

    /// Creates the embedder from raw artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if any artifact is malformed or the
    /// weights do not match the configuration.
    pub fn from_bytes(
        config_json: &[u8],
        weights: Vec<u8>,
        tokenizer_json: Vec<u8>,
    ) -> Result<Self, EmbeddingError> {
        let config: Config = serde_json::from_slice(config_json)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Invalid model config: {}", e)))?;
        let dims: ModelDims = serde_json::from_slice(config_json)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Invalid model config: {}", e)))?;

        info!(
            "Loading embedding model ({}d hidden, {} max positions, {:.2}MB weights)",
            dims.hidden_size,
            dims.max_position_embeddings,
            weights.len() as f64 / 1_000_000.0
        );

        if weights.len() < 8 {
            return Err(EmbeddingError::ModelLoad(
                "Model file too small".to_string(),
            ));
        }

        let device = Device::Cpu;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device).map_err(
            |e| EmbeddingError::ModelLoad(format!("Failed to create VarBuilder: {}", e)),
        )?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbeddingError::ModelLoad(format!("Failed to create BertModel: {}", e)))?;

        let tokenizer = TokenizerHandle::from_bytes(tokenizer_json, dims.max_position_embeddings)?;

        Ok(Self {
            model,
            tokenizer,
            model_id: DEFAULT_MODEL_ID.to_string(),
            hidden_size: dims.hidden_size,
            device,
        })
    }

    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Runs one padded forward pass and mean-pools over unmasked tokens.
    fn encode(&self, batch: &[TokenizedText]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let batch_size = batch.len();
        let max_len = batch.iter().map(TokenizedText::len).max().unwrap_or(0);

        let mut ids = Vec::with_capacity(batch_size * max_len);
        let mut mask = Vec::with_capacity(batch_size * max_len);
        for tokens in batch {
            ids.extend_from_slice(&tokens.ids);
            ids.resize(ids.len() + max_len - tokens.len(), 0);
            mask.extend_from_slice(&tokens.attention_mask);
            mask.resize(mask.len() + max_len - tokens.len(), 0);
        }

        let ids = Tensor::from_vec(ids, (batch_size, max_len), &self.device)
            .map_err(inference("create id tensor"))?;
        let mask = Tensor::from_vec(mask, (batch_size, max_len), &self.device)
            .map_err(inference("create mask tensor"))?;
        let type_ids = ids.zeros_like().map_err(inference("create type ids"))?;

        // [batch, seq] -> [batch, seq, hidden]
        let hidden = self
            .model
            .forward(&ids, &type_ids, Some(&mask))
            .map_err(inference("forward pass"))?;

        let mask = mask
            .to_dtype(DType::F32)
            .map_err(inference("cast mask"))?;
        let summed = hidden
            .broadcast_mul(&mask.unsqueeze(2).map_err(inference("expand mask"))?)
            .map_err(inference("apply mask"))?
            .sum(1)
            .map_err(inference("sum tokens"))?;
        let counts = mask.sum_keepdim(1).map_err(inference("count tokens"))?;
        let pooled = summed
            .broadcast_div(&counts)
            .map_err(inference("mean pool"))?;

        pooled.to_vec2::<f32>().map_err(inference("convert to vec"))
    }
}

fn inference<E: Display>(step: &'static str) -> impl Fn(E) -> EmbeddingError {
    move |e| EmbeddingError::InferenceFailed(format!("Failed to {}: {}", step, e))
}

impl Embedder for MiniLmEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embedding_dim(&self) -> usize {
        self.hidden_size
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let tokens = self.tokenizer.tokenize(text)?;
        self.encode(std::slice::from_ref(&tokens))?
            .pop()
            .ok_or_else(|| EmbeddingError::InferenceFailed("Model returned no rows".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = texts
            .iter()
            .map(|text| self.tokenizer.tokenize(text))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Encoding batch of {} texts", batch.len());
        self.encode(&batch)
    }
}
