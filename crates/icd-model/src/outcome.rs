//! Outcome surface of a validation run: counters and structured reasons.

use serde::{Deserialize, Serialize};

/// Aggregate counts of one validation run; reset at the start of every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub accepted_rows: u64,
    pub rejected_rows: u64,
    pub passed_checks_at_end: u64,
    pub failed_checks_at_end: u64,
}

impl RunTotals {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total number of data rows seen (accepted + rejected).
    pub fn row_count(&self) -> u64 {
        self.accepted_rows + self.rejected_rows
    }

    /// True when every row was accepted and every end check passed.
    pub fn is_clean(&self) -> bool {
        self.rejected_rows == 0 && self.failed_checks_at_end == 0
    }
}

/// A rejected data row together with the reason for its rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based row number within the data source, header rows included.
    pub row_number: u64,
    /// The raw items of the rejected row.
    pub items: Vec<String>,
    pub reason: String,
}

/// A check that failed once all rows were consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndCheckFailure {
    /// The failing check's description as declared in the ICD.
    pub description: String,
    pub reason: String,
}
