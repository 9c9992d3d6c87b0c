//! Listener that splits a validated data file into accepted and rejected
//! CSV files next to the input.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use icd_validate::ValidationListener;

/// Writes `<data>.accepted.csv` and `<data>.rejected.csv`; rejected rows
/// carry the rejection reason as a trailing column.
pub struct SplitListener {
    accepted: csv::Writer<File>,
    rejected: csv::Writer<File>,
}

impl SplitListener {
    pub fn create(data_path: &Path) -> Result<Self> {
        let accepted_path = sibling_with_suffix(data_path, "accepted");
        let rejected_path = sibling_with_suffix(data_path, "rejected");
        Ok(Self {
            accepted: csv::Writer::from_path(&accepted_path)
                .with_context(|| format!("create {}", accepted_path.display()))?,
            rejected: csv::Writer::from_path(&rejected_path)
                .with_context(|| format!("create {}", rejected_path.display()))?,
        })
    }
}

/// `customers.csv` becomes `customers.accepted.csv` (and so on), keeping
/// the file next to its input.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    path.with_file_name(format!("{stem}.{suffix}.csv"))
}

impl ValidationListener for SplitListener {
    fn accepted_row(&mut self, row: &[String]) {
        // The csv writer buffers; flushing happens on drop.
        let _ = self.accepted.write_record(row);
    }

    fn rejected_row(&mut self, row: &[String], reason: &str) {
        let mut record = row.to_vec();
        record.push(reason.to_string());
        let _ = self.rejected.write_record(&record);
    }
}
