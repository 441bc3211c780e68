//! Tokenization for the transformer embedder.
//!
//! [`TokenizerHandle`] wraps a HuggingFace tokenizer with truncation set to
//! the model's position limit, so over-long overviews never reach the model.

use crate::error::EmbeddingError;
use tokenizers::tokenizer::{Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

/// Token ids and attention mask for one input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl TokenizedText {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Owned tokenizer with truncation configured.
///
/// # Examples
///
/// ```ignore
/// let bytes = std::fs::read("tokenizer.json")?;
/// let handle = TokenizerHandle::from_bytes(bytes, 512)?;
/// let tokens = handle.tokenize("Two imprisoned men bond over a number of years.")?;
/// ```
#[derive(Clone)]
pub struct TokenizerHandle {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TokenizerHandle {
    /// Creates a tokenizer from serialized `tokenizer.json` bytes.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if the bytes do not describe a
    /// tokenizer, or `EmbeddingError::InvalidConfig` if truncation cannot be
    /// configured.
    pub fn from_bytes(tokenizer_bytes: Vec<u8>, max_length: usize) -> Result<Self, EmbeddingError> {
        let mut tokenizer = Tokenizer::from_bytes(tokenizer_bytes).map_err(|e| {
            EmbeddingError::ModelLoad(format!("Failed to deserialize tokenizer: {}", e))
        })?;

        configure_truncation(&mut tokenizer, max_length)?;

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Returns the configured maximum length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Tokenizes text, including special tokens ([CLS], [SEP]).
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::TokenizationFailed` if encoding fails or
    /// produces no tokens.
    pub fn tokenize(&self, text: &str) -> Result<TokenizedText, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::TokenizationFailed(format!("Encoding failed: {}", e)))?;

        if encoding.get_ids().is_empty() {
            return Err(EmbeddingError::TokenizationFailed(
                "Tokenizer returned no tokens".to_string(),
            ));
        }

        Ok(TokenizedText {
            ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }
}

fn configure_truncation(
    tokenizer: &mut Tokenizer,
    max_length: usize,
) -> Result<(), EmbeddingError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            stride: 0,
            strategy: TruncationStrategy::OnlyFirst,
            direction: TruncationDirection::Right,
        }))
        .map_err(|e| {
            EmbeddingError::InvalidConfig(format!(
                "Failed to configure tokenizer truncation: {}",
                e
            ))
        })?;

    Ok(())
}
