use super::progress::{IngestProgress, ProgressTimer};
use super::report::BatchReport;
use crate::catalog::Catalog;
use crate::error::IngestionError;
use crate::graph::GraphStore;
use tracing::{info, instrument, warn};

/// Upserts every catalog record into the graph.
///
/// Each movie is written in its own transaction. A failing record is
/// logged, recorded in the report and skipped; earlier records stay
/// committed.
pub fn ingest_catalog(store: &GraphStore, catalog: &Catalog) -> BatchReport {
    ingest_catalog_with(store, catalog, |_| {})
}

/// [`ingest_catalog`] with a progress callback invoked after every record.
#[instrument(skip_all, fields(records = catalog.len()))]
pub fn ingest_catalog_with<F>(store: &GraphStore, catalog: &Catalog, mut on_progress: F) -> BatchReport
where
    F: FnMut(&IngestProgress),
{
    let timer = ProgressTimer::new();
    let mut report = BatchReport {
        total: catalog.len(),
        ..Default::default()
    };
    let mut progress = IngestProgress::new(catalog.len());

    for (index, record) in catalog.iter().enumerate() {
        match store.upsert_movie(record) {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                warn!("Failed to ingest '{}': {}", record.title, e);
                report.record_failure(
                    index + 1,
                    Some(record.title.clone()),
                    IngestionError::Graph(e),
                );
                progress.failed += 1;
            }
        }

        progress.processed = index + 1;
        progress.elapsed_ms = timer.elapsed_ms();
        progress.current_title = Some(record.title.clone());
        on_progress(&progress);
    }

    info!(
        "Ingested {}/{} movies in {}ms",
        report.succeeded,
        report.total,
        timer.elapsed_ms()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixture_catalog, movie};

    #[test]
    fn test_ingest_fixture() {
        let store = GraphStore::in_memory().unwrap();
        let catalog = fixture_catalog();
        let report = ingest_catalog(&store, &catalog);

        assert!(report.is_complete());
        assert_eq!(report.total, catalog.len());
        assert_eq!(store.stats().unwrap().movies, catalog.len() as u64);
    }

    #[test]
    fn test_progress_per_record() {
        let store = GraphStore::in_memory().unwrap();
        let catalog = fixture_catalog();
        let mut updates = Vec::new();
        ingest_catalog_with(&store, &catalog, |p| updates.push(p.processed));

        assert_eq!(updates.len(), catalog.len());
        assert_eq!(updates.last().copied(), Some(catalog.len()));
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let store = GraphStore::in_memory().unwrap();
        let catalog = fixture_catalog();
        ingest_catalog(&store, &catalog);
        let before = store.stats().unwrap();
        let report = ingest_catalog(&store, &catalog);
        assert!(report.is_complete());
        assert_eq!(store.stats().unwrap(), before);
    }

    #[test]
    fn test_blank_title_fails_alone() {
        let store = GraphStore::in_memory().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert(movie("Heat", &["Crime"], Some(8.3))).unwrap();
        catalog.insert(movie("  ", &["Drama"], Some(7.0))).unwrap();
        catalog.insert(movie("Alien", &["Horror"], Some(8.5))).unwrap();

        let report = ingest_catalog(&store, &catalog);

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.succeeded, 2);
        let failure = &report.failures[0];
        assert_eq!(failure.row, 2);
        assert_eq!(failure.title.as_deref(), Some("  "));
        assert!(matches!(failure.error, IngestionError::Graph(_)));
        assert_eq!(store.stats().unwrap().movies, 2);

        // The aborted transaction leaves the store writable
        store.upsert_movie(&movie("Ran", &["Drama"], Some(8.2))).unwrap();
        assert_eq!(store.stats().unwrap().movies, 3);
    }
}
