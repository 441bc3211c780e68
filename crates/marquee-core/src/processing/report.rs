use crate::error::IngestionError;

/// One record that failed during a bulk operation.
#[derive(Debug)]
pub struct RecordFailure {
    /// 1-based position of the record in its batch
    pub row: usize,
    /// Title, when the record got far enough to have one
    pub title: Option<String>,
    pub error: IngestionError,
}

/// Per-record outcome summary of a bulk load or ingestion.
///
/// Failures never abort the batch; they are collected here and surfaced
/// once the loop finishes.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn record_failure(&mut self, row: usize, title: Option<String>, error: IngestionError) {
        self.failures.push(RecordFailure { row, title, error });
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// True when every record succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.succeeded == self.total
    }
}
