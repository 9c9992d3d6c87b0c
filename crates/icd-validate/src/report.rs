//! Serializable run report, the machine readable outcome surface of a
//! validation run.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use icd_model::{EndCheckFailure, RowIssue, RunTotals};

use crate::engine::Validator;

const REPORT_SCHEMA: &str = "icdcheck.run-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub schema: String,
    pub schema_version: u32,
    pub generated_at: String,
    pub icd_path: String,
    pub data_path: String,
    pub totals: RunTotals,
    pub rejected_rows: Vec<RowIssue>,
    pub failed_checks_at_end: Vec<EndCheckFailure>,
}

impl RunReport {
    /// Snapshot the most recent run of `validator`.
    pub fn from_run(validator: &Validator, icd_path: &Path, data_path: &Path) -> Self {
        Self {
            schema: REPORT_SCHEMA.to_string(),
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            icd_path: icd_path.display().to_string(),
            data_path: data_path.display().to_string(),
            totals: validator.totals(),
            rejected_rows: validator.row_issues().to_vec(),
            failed_checks_at_end: validator.end_check_failures().to_vec(),
        }
    }
}

/// Write a run report as pretty printed JSON.
pub fn write_run_report_json(output_path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serialize run report")?;
    std::fs::write(output_path, format!("{json}\n"))
        .with_context(|| format!("write run report: {}", output_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_round_trips_through_json() {
        let report = RunReport {
            schema: REPORT_SCHEMA.to_string(),
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            icd_path: "customers_icd.csv".to_string(),
            data_path: "customers.csv".to_string(),
            totals: RunTotals {
                accepted_rows: 2,
                rejected_rows: 1,
                passed_checks_at_end: 1,
                failed_checks_at_end: 0,
            },
            rejected_rows: vec![RowIssue {
                row_number: 3,
                items: vec!["x".to_string()],
                reason: "row must contain items for the following fields: amount".to_string(),
            }],
            failed_checks_at_end: Vec::new(),
        };
        let json = serde_json::to_string(&report).expect("serialize");
        let round: RunReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(round.totals, report.totals);
        assert_eq!(round.rejected_rows.len(), 1);
        assert_eq!(round.rejected_rows[0].row_number, 3);
    }
}
