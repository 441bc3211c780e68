// Movie embedding index: exact flat search or rust-cv/hnsw, persisted to disk

use super::artifact;
use super::types::{
    dot, l2_normalize, validate_dimension, EmbeddingMatrix, IndexKind, NormalizeError,
    ScoredMovie, SlotMap,
};
use crate::catalog::Catalog;
use crate::config::EMBED_BATCH_SIZE;
use crate::embedding::Embedder;
use crate::error::IndexError;
use crate::processing::{BuildProgress, ProgressTimer};
use hnsw::{Hnsw, Searcher};
use rand::rngs::StdRng;
use space::{Metric, Neighbor};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument, warn};

/// Minimum ef_search parameter for HNSW queries.
///
/// We use max(k * 2, MIN_EF_SEARCH) to scale with result count while
/// keeping a recall floor.
const MIN_EF_SEARCH: usize = 50;

/// Inner-product distance for unit vectors.
///
/// Computes 1 - dot, clamped to [0, 2] and scaled to u32. Vectors are
/// normalized before insertion, so this ranks exactly like cosine distance.
struct InnerProductDistance;

impl Metric<Box<[f32]>> for InnerProductDistance {
    type Unit = u32;

    fn distance(&self, a: &Box<[f32]>, b: &Box<[f32]>) -> u32 {
        let distance = (1.0 - dot(a, b)).clamp(0.0, 2.0);
        (distance * (u32::MAX as f32 / 2.0)) as u32
    }
}

/// HNSW graph over the rows of an [`EmbeddingMatrix`].
///
/// - **M = 16**: bidirectional links per node at layers > 0
/// - **M0 = 32**: links at layer 0 (2*M)
///
/// Graph node ids equal slot ids because rows are inserted in slot order.
struct HnswGraph {
    graph: Hnsw<InnerProductDistance, Box<[f32]>, StdRng, 16, 32>,
}

impl HnswGraph {
    fn build(matrix: &EmbeddingMatrix) -> Self {
        let mut graph = Hnsw::new(InnerProductDistance);
        let mut searcher = Searcher::default();
        for row in matrix.rows() {
            graph.insert(row.to_vec().into_boxed_slice(), &mut searcher);
        }
        Self { graph }
    }

    /// Up to `k` slots, rescored with the exact inner product.
    fn search(&self, matrix: &EmbeddingMatrix, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let actual_k = k.min(self.graph.len());
        if actual_k == 0 {
            return Vec::new();
        }
        let mut neighbors = vec![
            Neighbor {
                index: !0,
                distance: !0
            };
            actual_k
        ];
        let ef_search = k.saturating_mul(2).max(MIN_EF_SEARCH);
        let query_box = query.to_vec().into_boxed_slice();

        // A fresh searcher keeps queries free of shared mutable state.
        let mut searcher = Searcher::default();
        self.graph
            .nearest(&query_box, ef_search, &mut searcher, &mut neighbors);

        let mut hits: Vec<(usize, f32)> = neighbors
            .into_iter()
            .filter(|n| n.index != !0)
            .map(|n| (n.index, dot(matrix.row(n.index), query)))
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits
    }
}

/// Exact top-k by inner product. Ties keep ascending slot order.
fn flat_search(matrix: &EmbeddingMatrix, query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut hits: Vec<(usize, f32)> = matrix
        .rows()
        .enumerate()
        .map(|(slot, row)| (slot, dot(row, query)))
        .collect();
    hits.sort_by(|a, b| b.1.total_cmp(&a.1));
    hits.truncate(k);
    hits
}

/// Shared cancellation signal for a running build.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Semantic similarity index over catalog movies.
///
/// Owns the normalized embeddings (one row per slot) and the slot to title
/// mapping. Queries are encoded with the same embedder used at build time and
/// resolved to records through the catalog.
///
/// Built indexes are persisted to `artifact_dir` when one is configured; an
/// index without a directory lives in memory only.
///
/// # Example
///
/// ```ignore
/// let mut index = VectorIndex::new(embedder, catalog.clone())
///     .with_artifact_dir("data/index");
/// index.build(&catalog.embedding_inputs())?;
/// for (movie, score) in index.query("space exploration", 5)? {
///     println!("{:.3} {}", score, movie.title);
/// }
/// ```
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    catalog: Arc<Catalog>,
    artifact_dir: Option<PathBuf>,
    kind: IndexKind,
    matrix: EmbeddingMatrix,
    titles: Vec<String>,
    build_id: u64,
    hnsw: Option<HnswGraph>,
}

impl VectorIndex {
    /// Creates an empty, in-memory flat index.
    pub fn new(embedder: Arc<dyn Embedder>, catalog: Arc<Catalog>) -> Self {
        let dimension = embedder.embedding_dim();
        Self {
            embedder,
            catalog,
            artifact_dir: None,
            kind: IndexKind::Flat,
            matrix: EmbeddingMatrix::new(dimension),
            titles: Vec::new(),
            build_id: 0,
            hnsw: None,
        }
    }

    /// Persists builds to, and loads from, `dir`.
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Backend used by the next build.
    #[must_use]
    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.embedding_dim()
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Identifier of the build currently loaded, 0 when empty.
    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    pub fn slot_title(&self, slot: usize) -> Option<&str> {
        self.titles.get(slot).map(String::as_str)
    }

    pub fn artifact_dir(&self) -> Option<&Path> {
        self.artifact_dir.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Drops every slot. Previously issued slot ids become invalid.
    pub fn clear(&mut self) {
        self.matrix = EmbeddingMatrix::new(self.embedder.embedding_dim());
        self.titles.clear();
        self.build_id = 0;
        self.hnsw = None;
    }

    /// Encodes `records` as `(title, text)` pairs and replaces the index.
    pub fn build(&mut self, records: &[(String, String)]) -> Result<(), IndexError> {
        self.build_with(records, &CancelFlag::new(), |_| {})
    }

    /// Cancellable build with per-batch progress.
    ///
    /// Texts are encoded [`EMBED_BATCH_SIZE`] at a time; `cancel` is checked
    /// before each batch and `on_progress` called after it. On any error,
    /// including cancellation, the index is left empty and nothing is
    /// written.
    #[instrument(skip_all, fields(records = records.len(), kind = %self.kind))]
    pub fn build_with<F>(
        &mut self,
        records: &[(String, String)],
        cancel: &CancelFlag,
        on_progress: F,
    ) -> Result<(), IndexError>
    where
        F: FnMut(BuildProgress),
    {
        self.clear();
        let result = self.build_inner(records, cancel, on_progress);
        if let Err(e) = &result {
            warn!("Index build failed: {}", e);
            self.clear();
        }
        result
    }

    fn build_inner<F>(
        &mut self,
        records: &[(String, String)],
        cancel: &CancelFlag,
        mut on_progress: F,
    ) -> Result<(), IndexError>
    where
        F: FnMut(BuildProgress),
    {
        let dimension = self.embedder.embedding_dim();
        if dimension == 0 {
            return Err(IndexError::Build(
                "embedder reports zero dimension".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(records.len());
        for (id, _) in records {
            if id.trim().is_empty() {
                return Err(IndexError::Build("record id must not be empty".to_string()));
            }
            if !seen.insert(id.as_str()) {
                return Err(IndexError::Build(format!("duplicate record id '{}'", id)));
            }
        }

        let timer = ProgressTimer::new();
        let total = records.len();
        let mut matrix = EmbeddingMatrix::with_capacity(dimension, total);

        for batch in records.chunks(EMBED_BATCH_SIZE) {
            if cancel.is_cancelled() {
                info!("Index build cancelled after {} of {} records", matrix.len(), total);
                return Err(IndexError::Cancelled);
            }

            let texts: Vec<&str> = batch.iter().map(|(_, text)| text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                return Err(IndexError::Build(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            for ((id, _), mut vector) in batch.iter().zip(vectors) {
                if vector.len() != dimension {
                    return Err(IndexError::Build(format!(
                        "'{}': embedding has dimension {}, expected {}",
                        id,
                        vector.len(),
                        dimension
                    )));
                }
                l2_normalize(&mut vector)
                    .map_err(|e| IndexError::Build(format!("'{}': {}", id, e)))?;
                matrix.push(&vector)?;
            }

            on_progress(BuildProgress::new(matrix.len(), total, timer.elapsed_ms()));
        }

        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        let slots = SlotMap {
            build_id: new_build_id(),
            model_id: self.embedder.model_id().to_string(),
            dimension,
            kind: self.kind,
            titles: records.iter().map(|(id, _)| id.clone()).collect(),
        };

        if let Some(dir) = &self.artifact_dir {
            artifact::save(dir, &matrix, &slots)?;
        }

        self.install(matrix, slots);
        info!(
            "Built {} index with {} vectors in {}ms",
            self.kind,
            self.len(),
            timer.elapsed_ms()
        );
        Ok(())
    }

    /// Restores the index from its artifact directory.
    ///
    /// # Errors
    ///
    /// - `IndexError::NotFound` if no directory is configured or a file is missing
    /// - `IndexError::Corrupt` if the files are inconsistent or were built
    ///   by a different embedder or with a different embedding dimension
    #[instrument(skip_all)]
    pub fn load(&mut self) -> Result<(), IndexError> {
        let dir = self
            .artifact_dir
            .clone()
            .ok_or_else(|| IndexError::NotFound("no artifact directory configured".to_string()))?;

        let (matrix, slots) = artifact::load(&dir)?;
        let dimension = self.embedder.embedding_dim();
        if slots.dimension != dimension {
            return Err(IndexError::Corrupt(format!(
                "index was built with dimension {}, embedder produces {}",
                slots.dimension, dimension
            )));
        }
        if slots.model_id != self.embedder.model_id() {
            return Err(IndexError::Corrupt(format!(
                "index was built by '{}', embedder is '{}'",
                slots.model_id,
                self.embedder.model_id()
            )));
        }

        self.kind = slots.kind;
        self.install(matrix, slots);
        info!(
            "Loaded {} index with {} vectors from {}",
            self.kind,
            self.len(),
            dir.display()
        );
        Ok(())
    }

    /// Loads the persisted index, building and persisting it if none exists.
    ///
    /// Returns true if a build happened. Corrupt artifacts are reported, not
    /// rebuilt over.
    pub fn load_or_build(&mut self, records: &[(String, String)]) -> Result<bool, IndexError> {
        match self.load() {
            Ok(()) => Ok(false),
            Err(IndexError::NotFound(path)) => {
                info!("No index at {}, building", path);
                self.build(records)?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    fn install(&mut self, matrix: EmbeddingMatrix, slots: SlotMap) {
        self.hnsw = match self.kind {
            IndexKind::Hnsw => Some(HnswGraph::build(&matrix)),
            IndexKind::Flat => None,
        };
        self.matrix = matrix;
        self.titles = slots.titles;
        self.build_id = slots.build_id;
    }

    /// Slots nearest to an already-normalized query vector.
    ///
    /// Scores are inner products clamped to [-1, 1].
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        validate_dimension(self.matrix.dimension(), query.len())?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits = match &self.hnsw {
            Some(graph) => graph.search(&self.matrix, query, k),
            None => flat_search(&self.matrix, query, k),
        };
        hits.truncate(k);
        for hit in &mut hits {
            hit.1 = hit.1.clamp(-1.0, 1.0);
        }
        Ok(hits)
    }

    /// The `k` movies most similar to `text`, best first.
    ///
    /// An empty index, `k == 0` or a query that embeds to a zero vector all
    /// yield an empty result. Slots whose title is no longer in the catalog
    /// are skipped.
    #[instrument(skip_all, fields(k = k, index_size = self.len()))]
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredMovie>, IndexError> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = self.embedder.embed(text)?;
        validate_dimension(self.matrix.dimension(), query.len())?;
        match l2_normalize(&mut query) {
            Ok(()) => {}
            Err(NormalizeError::ZeroNorm) => {
                debug!("Query embedded to a zero vector");
                return Ok(Vec::new());
            }
            Err(e) => return Err(IndexError::Build(format!("query embedding: {}", e))),
        }

        let hits = self.nearest(&query, k)?;
        let mut results = Vec::with_capacity(hits.len());
        for (slot, score) in hits {
            let title = &self.titles[slot];
            match self.catalog.get(title) {
                Some(record) => results.push((record.clone(), score)),
                None => warn!("Slot {} maps to '{}', which is not in the catalog", slot, title),
            }
        }
        debug!("Vector query returned {} results", results.len());
        Ok(results)
    }
}

fn new_build_id() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    // Never 0, which marks an empty index
    nanos | 1
}
