//! CSV loading into a title-unique [`Catalog`].

use super::record::{MovieRecord, RawMovieRow};
use super::Catalog;
use crate::error::{CatalogError, IngestionError};
use crate::processing::BatchReport;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Loads the dataset at `path`.
///
/// Fails only if the file cannot be opened or its header cannot be read.
/// Individual bad rows are skipped and listed in the returned report.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>) -> Result<(Catalog, BatchReport), CatalogError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
    let (catalog, report) = load_catalog_from_reader(file)?;
    info!(
        "Loaded {} movies from {} ({} rows skipped)",
        catalog.len(),
        path.display(),
        report.failure_count()
    );
    Ok((catalog, report))
}

/// Loads a catalog from any CSV source with a header row.
pub fn load_catalog_from_reader<R: Read>(
    reader: R,
) -> Result<(Catalog, BatchReport), CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    // Surface a broken header as a hard error before iterating rows.
    csv_reader.headers()?;

    let mut catalog = Catalog::default();
    let mut report = BatchReport::default();

    for (index, result) in csv_reader.deserialize::<RawMovieRow>().enumerate() {
        let row_number = index + 1;
        report.total += 1;

        let outcome = result
            .map_err(|e| IngestionError::Malformed(e.to_string()))
            .and_then(|row| MovieRecord::from_row(row, row_number))
            .and_then(|record| catalog.insert(record));

        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                let title = match &err {
                    IngestionError::DuplicateTitle(title) => Some(title.clone()),
                    _ => None,
                };
                warn!("Skipping row {}: {}", row_number, err);
                report.record_failure(row_number, title, err);
            }
        }
    }

    Ok((catalog, report))
}

/// Convenience wrapper over [`load_catalog_from_reader`] for in-memory CSV text.
pub fn load_catalog_from_str(csv_text: &str) -> Result<(Catalog, BatchReport), CatalogError> {
    load_catalog_from_reader(csv_text.as_bytes())
}
