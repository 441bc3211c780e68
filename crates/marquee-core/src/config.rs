//! Production configuration constants.
//!
//! Retrieval tuning, artifact names and the genre vocabulary used across the
//! crate and in benchmarks.
//!
//! # Usage
//!
//! ```
//! use marquee_core::config::{GENRE_BOOST, OVERFETCH_FACTOR};
//!
//! let k = 10;
//! let candidates = k * OVERFETCH_FACTOR;
//! assert_eq!(candidates, 20);
//! assert!(GENRE_BOOST > 0.0);
//! ```

// =============================================================================
// Fusion
// =============================================================================

/// Additive score boost for candidates whose genres match the query intent.
///
/// Uncapped: a boosted score may exceed 1.0. Genre matches are ranked in
/// their own tier above non-matches regardless of this value; the boost only
/// shows up in the reported score.
pub const GENRE_BOOST: f32 = 0.2;

/// How many vector candidates to fetch per requested result before reranking.
pub const OVERFETCH_FACTOR: usize = 2;

/// Number of overview characters kept in a [`SearchResult`](crate::search::SearchResult).
pub const OVERVIEW_PREVIEW_CHARS: usize = 100;

/// Suffix appended to every truncated overview.
pub const OVERVIEW_ELLIPSIS: &str = "...";

/// Genre tokens recognised in free-text queries, in match order.
pub const GENRE_VOCABULARY: &[&str] = &[
    "action",
    "adventure",
    "animation",
    "biography",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "family",
    "fantasy",
    "film-noir",
    "history",
    "horror",
    "music",
    "musical",
    "mystery",
    "romance",
    "sci-fi",
    "sport",
    "thriller",
    "war",
    "western",
];

// =============================================================================
// Graph queries
// =============================================================================

/// Rating threshold used when a director query does not specify one.
pub const DEFAULT_MIN_RATING: f32 = 7.0;

/// Maximum rows returned by the collaboration query.
pub const MAX_COLLABORATORS: usize = 10;

/// Valid range for movie ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<f32> = 0.0..=10.0;

/// Valid range for critic meta scores.
pub const META_SCORE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=100.0;

// =============================================================================
// Embedding and index build
// =============================================================================

/// Default sentence-embedding model.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of all-MiniLM-L6-v2.
pub const MINILM_EMBEDDING_DIM: usize = 384;

/// Texts encoded per embedder call during an index build.
///
/// Progress is reported and cancellation checked once per batch.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Binary file holding the normalized embedding matrix.
pub const INDEX_FILENAME: &str = "movie_embeddings.index";

/// JSON file holding the slot id to title mapping.
pub const SLOT_MAP_FILENAME: &str = "index_to_movie.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for genre in GENRE_VOCABULARY {
            assert_eq!(*genre, genre.to_lowercase());
            assert!(seen.insert(*genre), "duplicate genre token {}", genre);
        }
        assert_eq!(GENRE_VOCABULARY.len(), 22);
    }

    #[test]
    fn test_default_min_rating_in_range() {
        assert!(RATING_RANGE.contains(&DEFAULT_MIN_RATING));
    }
}
