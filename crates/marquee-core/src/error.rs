//! Error types for marquee-core.
//!
//! One enum per concern: embedding inference, vector index lifecycle, graph
//! storage, catalog loading and per-record ingestion failures. Query
//! problems that should not propagate (blank names, empty text) are handled
//! by returning empty results at the call site; only clearly invalid numeric
//! parameters surface as [`GraphError::InvalidQuery`].

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Failed to load model weights or configuration
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Failed to tokenize text
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Forward pass through the model failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from building, loading or querying the vector index.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The build attempt failed; no partial index is usable.
    #[error("Index build failed: {0}")]
    Build(String),
    /// No persisted artifact exists. Callers may fall back to a build.
    #[error("No persisted index found at {0}")]
    NotFound(String),
    /// Artifact files are malformed or come from different builds.
    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),
    /// Filesystem error while reading or writing artifacts
    #[error("Index I/O error: {0}")]
    Io(String),
    /// Vector dimension mismatch (expected vs actual)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension received
        actual: usize,
    },
    /// The build was cancelled before completion
    #[error("Index build cancelled")]
    Cancelled,
    /// The embedder failed while encoding text
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Errors from the graph store.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Database error (open, transaction, table access, commit)
    #[error("Database error: {0}")]
    Database(String),
    /// Node payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A query parameter is invalid and was rejected before reaching the store
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Failure of a single catalog record during loading or graph ingestion.
///
/// These never abort a bulk operation; they are collected into a
/// [`BatchReport`](crate::processing::BatchReport).
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Row has no title, so it cannot be keyed
    #[error("Row {row} has no title")]
    MissingTitle {
        /// 1-based data row number
        row: usize,
    },
    /// A record with this title was already accepted
    #[error("Duplicate title: {0}")]
    DuplicateTitle(String),
    /// The CSV record itself could not be decoded
    #[error("Malformed record: {0}")]
    Malformed(String),
    /// Writing the movie and its relationships failed
    #[error("Graph write failed: {0}")]
    Graph(#[from] GraphError),
}

/// Errors that prevent a catalog from being read at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Dataset file could not be opened
    #[error("Failed to read dataset: {0}")]
    Io(String),
    /// CSV header or reader failure
    #[error("CSV error: {0}")]
    Csv(String),
}

// Conversion implementations for error chaining

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Serialization(err.to_string())
    }
}

impl From<redb::DatabaseError> for GraphError {
    fn from(err: redb::DatabaseError) -> Self {
        GraphError::Database(format!("Failed to open database: {}", err))
    }
}

impl From<redb::TransactionError> for GraphError {
    fn from(err: redb::TransactionError) -> Self {
        GraphError::Database(format!("Failed to begin transaction: {}", err))
    }
}

impl From<redb::TableError> for GraphError {
    fn from(err: redb::TableError) -> Self {
        GraphError::Database(format!("Failed to open table: {}", err))
    }
}

impl From<redb::StorageError> for GraphError {
    fn from(err: redb::StorageError) -> Self {
        GraphError::Database(format!("Storage error: {}", err))
    }
}

impl From<redb::CommitError> for GraphError {
    fn from(err: redb::CommitError) -> Self {
        GraphError::Database(format!("Failed to commit: {}", err))
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        CatalogError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err.to_string())
    }
}
