//! Progress tracking types for long-running batch operations.
//!
//! Index builds report a [`BuildProgress`] after each encoded batch; graph
//! ingestion reports an [`IngestProgress`] after each record.

use std::time::Instant;

/// Progress of a vector index build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildProgress {
    /// Number of records encoded so far
    pub encoded: usize,
    /// Total number of records in the build
    pub total: usize,
    /// Time elapsed since the build started (milliseconds)
    pub elapsed_ms: u64,
}

impl BuildProgress {
    pub fn new(encoded: usize, total: usize, elapsed_ms: u64) -> Self {
        Self {
            encoded,
            total,
            elapsed_ms,
        }
    }

    /// Returns the completion percentage (0.0 to 100.0).
    pub fn percent_complete(&self) -> f64 {
        percent(self.encoded, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.encoded >= self.total
    }

    /// Returns estimated time remaining in milliseconds, if computable.
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        remaining_ms(self.encoded, self.total, self.elapsed_ms)
    }

    /// Records encoded per second.
    pub fn records_per_second(&self) -> f64 {
        if self.elapsed_ms == 0 {
            0.0
        } else {
            self.encoded as f64 / (self.elapsed_ms as f64 / 1000.0)
        }
    }
}

/// Progress of a graph ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestProgress {
    /// Records attempted so far (successes and failures)
    pub processed: usize,
    /// Records that failed so far
    pub failed: usize,
    /// Total number of records to ingest
    pub total: usize,
    /// Time elapsed since ingestion started (milliseconds)
    pub elapsed_ms: u64,
    /// Title of the record just processed
    pub current_title: Option<String>,
}

impl IngestProgress {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            failed: 0,
            total,
            elapsed_ms: 0,
            current_title: None,
        }
    }

    pub fn percent_complete(&self) -> f64 {
        percent(self.processed, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        remaining_ms(self.processed, self.total, self.elapsed_ms)
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (done as f64 / total as f64) * 100.0
    }
}

fn remaining_ms(done: usize, total: usize, elapsed_ms: u64) -> Option<u64> {
    if done == 0 || done >= total {
        return None;
    }
    let ms_per_item = elapsed_ms / done as u64;
    Some((total - done) as u64 * ms_per_item)
}

/// Helper for tracking elapsed time during processing.
pub struct ProgressTimer {
    start: Instant,
}

impl ProgressTimer {
    /// Creates a new timer starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for ProgressTimer {
    fn default() -> Self {
        Self::new()
    }
}
