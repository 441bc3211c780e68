//! Semantic movie search with genre-aware fusion.
//!
//! # Architecture
//!
//! - `types`: SearchResult, IndexKind, SlotMap, EmbeddingMatrix
//! - `vector`: VectorIndex (flat inner product or HNSW) and its build/load lifecycle
//! - `artifact`: the two-file on-disk format of a built index
//! - `intent`: IntentExtractor, genre tokens in free text
//! - `fusion`: FusionSearch and the two-tier genre rerank
//!
//! # Usage
//!
//! ```ignore
//! use marquee_core::search::{FusionSearch, IntentExtractor, VectorIndex};
//!
//! let mut index = VectorIndex::new(embedder, catalog.clone()).with_artifact_dir(dir);
//! index.load_or_build(&catalog.embedding_inputs())?;
//!
//! let intent = IntentExtractor::new();
//! let results = FusionSearch::new(&index, &intent).search("war drama", 10)?;
//! ```
//!
//! # Algorithm Details
//!
//! **Vector index**:
//! - Embeddings are L2-normalized, so inner product equals cosine similarity
//! - Flat backend is exact; equal scores keep slot order
//! - HNSW backend (M=16, M0=32, ef=max(2k, 50)) rescored exactly
//!
//! **Fusion**:
//! - Fetch `2k` candidates
//! - Candidates sharing a mentioned genre get +0.2 and rank first
//! - Each tier sorted by score, stable; truncate to `k`

pub mod artifact;
mod fusion;
mod intent;
pub mod types;
mod vector;

pub use fusion::{rerank_by_genre, FusionSearch};
pub use intent::{title_case, IntentExtractor};
pub use types::{overview_preview, EmbeddingMatrix, IndexKind, ScoredMovie, SearchResult, SlotMap};
pub use vector::{CancelFlag, VectorIndex};
