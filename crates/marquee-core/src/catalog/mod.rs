//! Movie catalog: typed records and the CSV loader that produces them.
//!
//! A [`Catalog`] is keyed by title. Insertion order is preserved, so the
//! vector index assigns slot ids in the same order rows appear in the
//! dataset.

mod loader;
mod record;

pub use loader::{load_catalog, load_catalog_from_reader, load_catalog_from_str};
pub use record::{
    parse_bounded, parse_runtime, parse_votes, parse_year, split_genres, MovieRecord,
    RawMovieRow, MAX_CAST,
};

use crate::error::IngestionError;
use std::collections::HashMap;
use tracing::warn;

/// Title-unique, insertion-ordered collection of movies.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<MovieRecord>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. A title already present is rejected; the first
    /// occurrence stays.
    pub fn insert(&mut self, record: MovieRecord) -> Result<(), IngestionError> {
        if self.by_title.contains_key(&record.title) {
            return Err(IngestionError::DuplicateTitle(record.title));
        }
        self.by_title
            .insert(record.title.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, title: &str) -> Option<&MovieRecord> {
        self.by_title.get(title).map(|&i| &self.records[i])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &MovieRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(title, embedding text)` pairs in insertion order, ready for
    /// [`VectorIndex::build`](crate::search::VectorIndex::build).
    pub fn embedding_inputs(&self) -> Vec<(String, String)> {
        self.records
            .iter()
            .map(|r| (r.title.clone(), r.embedding_text()))
            .collect()
    }
}

impl FromIterator<MovieRecord> for Catalog {
    /// Collects records, keeping the first of any duplicate titles.
    fn from_iter<I: IntoIterator<Item = MovieRecord>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for record in iter {
            if let Err(e) = catalog.insert(record) {
                warn!("Skipping record: {}", e);
            }
        }
        catalog
    }
}
