//! Listener contract for validation events.

use icd_model::Row;

/// Observer of one validation run.
///
/// Notification order matches row order. Listeners observe; they must not
/// mutate engine state, and the engine completes the run with zero
/// listeners attached just as well.
pub trait ValidationListener {
    fn accepted_row(&mut self, row: &[String]) {
        let _ = row;
    }

    fn rejected_row(&mut self, row: &[String], reason: &str) {
        let _ = (row, reason);
    }

    fn check_at_end_failed(&mut self, description: &str, reason: &str) {
        let _ = (description, reason);
    }
}

/// Listener that keeps everything it hears; handy for tests and for
/// callers that want the full partition after the run.
#[derive(Debug, Default)]
pub struct CollectingListener {
    pub accepted: Vec<Row>,
    pub rejected: Vec<(Row, String)>,
    pub failed_end_checks: Vec<(String, String)>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValidationListener for CollectingListener {
    fn accepted_row(&mut self, row: &[String]) {
        self.accepted.push(row.to_vec());
    }

    fn rejected_row(&mut self, row: &[String], reason: &str) {
        self.rejected.push((row.to_vec(), reason.to_string()));
    }

    fn check_at_end_failed(&mut self, description: &str, reason: &str) {
        self.failed_end_checks
            .push((description.to_string(), reason.to_string()));
    }
}
