//! Genre-aware reranking of vector candidates.
//!
//! Fusion over-fetches `OVERFETCH_FACTOR * k` candidates from the vector
//! index, then applies a two-tier lexical override: candidates carrying a
//! genre mentioned in the query are boosted by [`GENRE_BOOST`] and always
//! ranked ahead of the rest.

use super::intent::IntentExtractor;
use super::types::{ScoredMovie, SearchResult};
use super::vector::VectorIndex;
use crate::config::{GENRE_BOOST, OVERFETCH_FACTOR};
use crate::error::IndexError;
use tracing::{debug, instrument};

/// Reorders `candidates` by genre intent and keeps the best `k`.
///
/// With no `genres`, the first `k` candidates are returned unchanged.
/// Otherwise matches (sharing at least one genre) get `+GENRE_BOOST` and
/// come first; each tier is stably sorted by score descending.
pub fn rerank_by_genre(candidates: Vec<ScoredMovie>, genres: &[String], k: usize) -> Vec<ScoredMovie> {
    let mut candidates = candidates;
    if genres.is_empty() {
        candidates.truncate(k);
        return candidates;
    }

    let (mut matches, mut others): (Vec<ScoredMovie>, Vec<ScoredMovie>) = candidates
        .into_iter()
        .partition(|(movie, _)| movie.has_any_genre(genres));

    for (_, score) in &mut matches {
        *score += GENRE_BOOST;
    }
    matches.sort_by(|a, b| b.1.total_cmp(&a.1));
    others.sort_by(|a, b| b.1.total_cmp(&a.1));

    matches.extend(others);
    matches.truncate(k);
    matches
}

/// Hybrid search over a vector index and an intent extractor.
///
/// # Example
///
/// ```ignore
/// let fusion = FusionSearch::new(&index, &intent);
/// for hit in fusion.search("a gritty crime drama", 10)? {
///     println!("{:.3} {} ({})", hit.score, hit.title, hit.genre);
/// }
/// ```
pub struct FusionSearch<'a> {
    index: &'a VectorIndex,
    intent: &'a IntentExtractor,
}

impl<'a> FusionSearch<'a> {
    pub fn new(index: &'a VectorIndex, intent: &'a IntentExtractor) -> Self {
        Self { index, intent }
    }

    /// Genres the query mentions, as used for boosting.
    pub fn detected_genres(&self, query: &str) -> Vec<String> {
        self.intent.extract_genres(query)
    }

    /// Up to `k` results for `query`, genre matches first.
    ///
    /// A blank query or `k == 0` yields an empty list.
    #[instrument(skip_all, fields(k = k))]
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, IndexError> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let genres = self.detected_genres(query);
        let candidates = self.index.query(query, k.saturating_mul(OVERFETCH_FACTOR))?;
        debug!(
            "Fusing {} candidates with genres {:?}",
            candidates.len(),
            genres
        );

        Ok(rerank_by_genre(candidates, &genres, k)
            .iter()
            .map(|(movie, score)| SearchResult::from_scored(movie, *score))
            .collect())
    }
}
