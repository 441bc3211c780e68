//! Embedding model abstractions and implementations.
//!
//! ## Core Trait
//!
//! - [`Embedder`] - text to dense vector
//!
//! ## Implementations
//!
//! - [`MiniLmEmbedder`] - BERT sentence encoder using Candle
//! - [`HashingEmbedder`] - deterministic FNV-1a feature hashing
//! - [`TokenizerHandle`] - Wrapper for HuggingFace tokenizers
//!
//! ## Example
//!
//! ```ignore
//! use marquee_core::embedding::{Embedder, MiniLmEmbedder};
//!
//! let embedder = MiniLmEmbedder::from_dir("models/all-MiniLM-L6-v2")?;
//! let embedding = embedder.embed("Batman faces the Joker")?;
//! ```

mod hashing;
mod traits;

pub mod model;
pub mod tokenizer;

pub use hashing::HashingEmbedder;
pub use model::MiniLmEmbedder;
pub use tokenizer::{TokenizedText, TokenizerHandle};
pub use traits::Embedder;
