//! The embedding model abstraction.

use crate::error::EmbeddingError;

/// Text to dense vector.
///
/// Implementations are opaque to the rest of the crate: the vector index
/// only relies on `embed` returning `embedding_dim()` values. Output need not
/// be normalized; the index normalizes before storing or querying.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one embedder can be shared via
/// `Arc<dyn Embedder>` between the index and its callers.
///
/// # Examples
///
/// ```
/// use marquee_core::embedding::{Embedder, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(64);
/// let vector = embedder.embed("a heist thriller").unwrap();
/// assert_eq!(vector.len(), embedder.embedding_dim());
/// ```
pub trait Embedder: Send + Sync {
    /// Identifier of the model (e.g. "sentence-transformers/all-MiniLM-L6-v2").
    fn model_id(&self) -> &str;

    /// Returns the embedding dimension (vector size).
    ///
    /// All embeddings from this model will have this length.
    fn embedding_dim(&self) -> usize;

    /// Encodes a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Encodes several texts, one vector per input in the same order.
    ///
    /// The default calls [`embed`](Self::embed) sequentially; models with a
    /// real batched forward pass override it.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
