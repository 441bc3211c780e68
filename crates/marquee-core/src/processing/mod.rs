//! Bulk operations and their bookkeeping.
//!
//! - [`ingest_catalog`] loads a catalog into the graph store, one
//!   transaction per movie
//! - [`BatchReport`] collects per-record outcomes instead of aborting
//! - [`BuildProgress`] / [`IngestProgress`] feed progress callbacks
//!
//! # Example
//!
//! ```ignore
//! use marquee_core::processing::ingest_catalog_with;
//!
//! let report = ingest_catalog_with(&store, &catalog, |p| {
//!     println!("{:.0}% complete", p.percent_complete());
//! });
//! for failure in &report.failures {
//!     eprintln!("row {}: {}", failure.row, failure.error);
//! }
//! ```

mod ingest;
mod progress;
mod report;

pub use ingest::{ingest_catalog, ingest_catalog_with};
pub use progress::{BuildProgress, IngestProgress, ProgressTimer};
pub use report::{BatchReport, RecordFailure};
