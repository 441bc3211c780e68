//! FNV-1a feature-hashing embedder.
//!
//! Deterministic and model-free: character n-grams of the lowercased text
//! are hashed into signed buckets. Texts sharing many n-grams land close
//! together, which is enough for offline runs, tests and benchmarks.

use super::traits::Embedder;
use crate::config::MINILM_EMBEDDING_DIM;
use crate::error::EmbeddingError;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    ngram_range: (usize, usize),
    model_id: String,
}

impl HashingEmbedder {
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self {
            dimension,
            ngram_range: (3, 4),
            model_id: format!("fnv1a-hash-{}", dimension),
        }
    }

    #[must_use]
    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        assert!(min > 0 && min <= max, "invalid n-gram range");
        self.ngram_range = (min, max);
        self
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(MINILM_EMBEDDING_DIM)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embedding_dim(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];
        let chars: Vec<char> = text.to_lowercase().chars().collect();

        let mut buf = String::new();
        for n in self.ngram_range.0..=self.ngram_range.1 {
            if n > chars.len() {
                continue;
            }
            for window in chars.windows(n) {
                buf.clear();
                buf.extend(window);
                let h = fnv1a(buf.as_bytes());
                let bucket = (h % self.dimension as u64) as usize;
                let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}
