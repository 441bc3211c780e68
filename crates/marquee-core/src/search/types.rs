use crate::catalog::MovieRecord;
use crate::config::{OVERVIEW_ELLIPSIS, OVERVIEW_PREVIEW_CHARS};
use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A catalog record paired with its retrieval score.
pub type ScoredMovie = (MovieRecord, f32);

/// Nearest-neighbor backend used by a [`VectorIndex`](super::VectorIndex).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact inner product over every slot
    #[default]
    Flat,
    /// Approximate search over an HNSW graph, rescored exactly
    Hnsw,
}

impl IndexKind {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            IndexKind::Flat => 0,
            IndexKind::Hnsw => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(IndexKind::Flat),
            1 => Some(IndexKind::Hnsw),
            _ => None,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => f.write_str("flat"),
            IndexKind::Hnsw => f.write_str("hnsw"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(IndexKind::Flat),
            "hnsw" => Ok(IndexKind::Hnsw),
            other => Err(format!("unknown index kind '{}'", other)),
        }
    }
}

/// Slot id to title mapping for one build.
///
/// Persisted as `index_to_movie.json` next to the embedding matrix. The
/// `build_id` ties the two files together; `model_id` ties them to the
/// embedder that produced the vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMap {
    pub build_id: u64,
    pub model_id: String,
    pub dimension: usize,
    pub kind: IndexKind,
    /// `titles[slot]` is the title stored at that slot
    pub titles: Vec<String>,
}

/// Row-major matrix of unit-length embeddings, one row per slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dimension: usize, rows: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(dimension * rows),
        }
    }

    /// Wraps existing row-major values.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self, IndexError> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(IndexError::Corrupt(format!(
                "{} values do not form rows of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { dimension, data })
    }

    pub fn push(&mut self, row: &[f32]) -> Result<(), IndexError> {
        validate_dimension(self.dimension, row.len())?;
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, slot: usize) -> &[f32] {
        let start = slot * self.dimension;
        &self.data[start..start + self.dimension]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// One fused search hit, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub year: Option<i32>,
    /// Genres in display form ("Action, Crime, Drama")
    pub genre: String,
    /// First characters of the overview followed by an ellipsis
    pub overview: String,
    pub score: f32,
}

impl SearchResult {
    pub fn from_scored(record: &MovieRecord, score: f32) -> Self {
        Self {
            title: record.title.clone(),
            year: record.year,
            genre: record.genre_label(),
            overview: overview_preview(&record.overview),
            score,
        }
    }
}

/// First [`OVERVIEW_PREVIEW_CHARS`] characters plus [`OVERVIEW_ELLIPSIS`].
///
/// Counts characters, not bytes. The ellipsis is appended even when nothing
/// was cut.
pub fn overview_preview(overview: &str) -> String {
    let mut preview: String = overview.chars().take(OVERVIEW_PREVIEW_CHARS).collect();
    preview.push_str(OVERVIEW_ELLIPSIS);
    preview
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Validates that an embedding has the expected dimension.
pub fn validate_dimension(expected: usize, actual: usize) -> Result<(), IndexError> {
    if actual == expected {
        Ok(())
    } else {
        Err(IndexError::DimensionMismatch { expected, actual })
    }
}

/// Why a vector cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    NonFinite,
    ZeroNorm,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::NonFinite => f.write_str("embedding contains NaN or infinite values"),
            NormalizeError::ZeroNorm => f.write_str("embedding has zero norm"),
        }
    }
}

/// Scales `v` to unit length in place.
pub fn l2_normalize(v: &mut [f32]) -> Result<(), NormalizeError> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(NormalizeError::NonFinite);
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() {
        return Err(NormalizeError::NonFinite);
    }
    if norm <= f32::EPSILON {
        return Err(NormalizeError::ZeroNorm);
    }
    v.iter_mut().for_each(|x| *x /= norm);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::movie;

    #[test]
    fn test_overview_preview_counts_chars() {
        let long = "é".repeat(150);
        let preview = overview_preview(&long);
        assert_eq!(preview.chars().count(), OVERVIEW_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));

        assert_eq!(overview_preview("Short."), "Short....");
        assert_eq!(overview_preview(""), "...");
    }

    #[test]
    fn test_search_result_from_scored() {
        let mut record = movie("Heat", &["Action", "Crime"], Some(8.3));
        record.year = Some(1995);
        let result = SearchResult::from_scored(&record, 0.42);
        assert_eq!(result.genre, "Action, Crime");
        assert_eq!(result.year, Some(1995));
        assert_eq!(result.score, 0.42);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        assert_eq!(l2_normalize(&mut [0.0, 0.0]), Err(NormalizeError::ZeroNorm));
        assert_eq!(
            l2_normalize(&mut [f32::NAN, 1.0]),
            Err(NormalizeError::NonFinite)
        );
    }

    #[test]
    fn test_matrix_rows() {
        let mut matrix = EmbeddingMatrix::new(2);
        matrix.push(&[1.0, 0.0]).unwrap();
        matrix.push(&[0.0, 1.0]).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.row(1), &[0.0, 1.0]);
        assert!(matches!(
            matrix.push(&[1.0]),
            Err(IndexError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(EmbeddingMatrix::from_raw(3, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_index_kind_parse_and_codes() {
        assert_eq!("HNSW".parse::<IndexKind>().unwrap(), IndexKind::Hnsw);
        assert!("tree".parse::<IndexKind>().is_err());
        for kind in [IndexKind::Flat, IndexKind::Hnsw] {
            assert_eq!(IndexKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(IndexKind::from_u8(7), None);
    }
}
