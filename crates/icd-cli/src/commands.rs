//! Command implementations.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use icd_model::{EndCheckFailure, RowIssue, RunTotals};
use icd_schema::IcdLoader;
use icd_validate::{RunReport, Validator, write_run_report_json};

use crate::cli::ValidateArgs;
use crate::split::SplitListener;

/// Outcome of validating one data file.
pub struct FileOutcome {
    pub path: PathBuf,
    pub totals: RunTotals,
    pub row_issues: Vec<RowIssue>,
    pub end_check_failures: Vec<EndCheckFailure>,
}

/// Outcome of a whole `validate` invocation.
pub struct ValidateOutcome {
    pub files: Vec<FileOutcome>,
}

impl ValidateOutcome {
    /// True when any file had rejected rows or failed end checks.
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|file| !file.totals.is_clean())
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateOutcome> {
    if args.report.is_some() && args.data.len() != 1 {
        bail!("--report needs exactly one data file");
    }

    let icd = IcdLoader::new()
        .load(&args.icd)
        .with_context(|| format!("load ICD: {}", args.icd.display()))?;
    let mut validator = Validator::new(icd);

    let mut files = Vec::with_capacity(args.data.len());
    for data_path in &args.data {
        if args.split {
            validator.add_listener(Box::new(SplitListener::create(data_path)?));
        }
        validator
            .validate(data_path)
            .with_context(|| format!("validate {}", data_path.display()))?;
        // Drop the split listener so its files flush before the next run.
        drop(validator.take_listeners());

        if let Some(report_path) = &args.report {
            let report = RunReport::from_run(&validator, &args.icd, data_path);
            write_run_report_json(report_path, &report)?;
            info!(path = %report_path.display(), "wrote run report");
        }
        files.push(FileOutcome {
            path: data_path.clone(),
            totals: validator.totals(),
            row_issues: validator.row_issues().to_vec(),
            end_check_failures: validator.end_check_failures().to_vec(),
        });
    }
    Ok(ValidateOutcome { files })
}

pub fn run_formats() -> Result<()> {
    let loader = IcdLoader::new();
    println!("field types:");
    for tag in loader.field_registry().tags() {
        println!("  {tag}");
    }
    println!("check types:");
    for tag in loader.check_registry().tags() {
        println!("  {tag}");
    }
    Ok(())
}
