//! The validation engine: feeds data rows through field formats and
//! checks, classifies every row as accepted or rejected, and reports end
//! of data check results.
//!
//! Row level failures never abort a run; the engine converts them into
//! rejection events and keeps going. Only structural errors (broken
//! quoting, truncated fixed width lines, unreadable containers) terminate.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use icd_model::{EndCheckFailure, FieldValue, FormatKind, RowIssue, RunTotals};

use icd_ingest::{SheetProvider, open_data_rows};
use icd_schema::{FieldFormat, FieldValueError, Icd};

use crate::error::ValidateError;
use crate::listener::ValidationListener;

/// Outcome of judging a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    Accepted,
    Rejected(String),
}

/// Runs validation of data files against one loaded ICD.
///
/// The validator owns the ICD because checks accumulate state across the
/// rows of a run; that state is reset at the start of every run, so
/// repeated runs over the same data yield identical counts.
pub struct Validator {
    icd: Icd,
    listeners: Vec<Box<dyn ValidationListener>>,
    totals: RunTotals,
    row_issues: Vec<RowIssue>,
    end_check_failures: Vec<EndCheckFailure>,
}

impl Validator {
    pub fn new(icd: Icd) -> Self {
        Self {
            icd,
            listeners: Vec::new(),
            totals: RunTotals::default(),
            row_issues: Vec::new(),
            end_check_failures: Vec::new(),
        }
    }

    pub fn icd(&self) -> &Icd {
        &self.icd
    }

    /// Attach a listener; listeners are notified in attachment order.
    pub fn add_listener(&mut self, listener: Box<dyn ValidationListener>) {
        self.listeners.push(listener);
    }

    /// Detach all listeners, returning them in attachment order.
    pub fn take_listeners(&mut self) -> Vec<Box<dyn ValidationListener>> {
        std::mem::take(&mut self.listeners)
    }

    /// Counts of the most recent run.
    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Rejected rows of the most recent run, in row order.
    pub fn row_issues(&self) -> &[RowIssue] {
        &self.row_issues
    }

    /// Failed end of data checks of the most recent run.
    pub fn end_check_failures(&self) -> &[EndCheckFailure] {
        &self.end_check_failures
    }

    /// Validate one data file against the ICD.
    pub fn validate(&mut self, data_path: &Path) -> Result<RunTotals, ValidateError> {
        self.validate_with_provider(data_path, None)
    }

    pub fn validate_with_provider(
        &mut self,
        data_path: &Path,
        provider: Option<&dyn SheetProvider>,
    ) -> Result<RunTotals, ValidateError> {
        info!(path = %data_path.display(), "validating");
        self.totals.reset();
        self.row_issues.clear();
        self.end_check_failures.clear();
        for check in self.icd.checks_mut() {
            check.reset();
        }

        let widths = self.icd.fixed_widths();
        let header_rows = self.icd.data_format().header_rows();
        let is_fixed = self.icd.data_format().kind() == FormatKind::FixedWidth;
        // The row stream holds the open data file; it is dropped, and the
        // file with it, on every exit path of this function.
        let rows = open_data_rows(self.icd.data_format(), data_path, &widths, provider)?;

        let mut row_number = 0u64;
        for row in rows {
            let row = row?;
            row_number += 1;
            if row_number <= header_rows {
                continue;
            }
            let verdict = match self.validate_items(&row, is_fixed) {
                Ok(values) => self.run_row_checks(row_number, &values),
                Err(reason) => RowVerdict::Rejected(reason),
            };
            match verdict {
                RowVerdict::Accepted => {
                    self.totals.accepted_rows += 1;
                    for listener in &mut self.listeners {
                        listener.accepted_row(&row);
                    }
                }
                RowVerdict::Rejected(reason) => {
                    debug!(row = row_number, reason = %reason, "rejected row");
                    self.totals.rejected_rows += 1;
                    for listener in &mut self.listeners {
                        listener.rejected_row(&row, &reason);
                    }
                    self.row_issues.push(RowIssue {
                        row_number,
                        items: row,
                        reason,
                    });
                }
            }
        }

        for check in self.icd.checks_mut() {
            match check.check_at_end() {
                Ok(()) => self.totals.passed_checks_at_end += 1,
                Err(error) => {
                    let description = check.description().to_string();
                    let reason =
                        format!("check at end of data failed: {description:?}: {error}");
                    debug!(check = %description, reason = %reason, "failed end check");
                    self.totals.failed_checks_at_end += 1;
                    for listener in &mut self.listeners {
                        listener.check_at_end_failed(&description, &reason);
                    }
                    self.end_check_failures.push(EndCheckFailure {
                        description,
                        reason,
                    });
                }
            }
        }

        info!(
            accepted = self.totals.accepted_rows,
            rejected = self.totals.rejected_rows,
            passed_end_checks = self.totals.passed_checks_at_end,
            failed_end_checks = self.totals.failed_checks_at_end,
            "run finished"
        );
        Ok(self.totals)
    }

    /// Validate every item of `row` in field order, producing the typed
    /// value map, or the rejection reason for the first failure.
    fn validate_items(
        &self,
        row: &[String],
        is_fixed: bool,
    ) -> Result<BTreeMap<String, FieldValue>, String> {
        let fields = self.icd.fields();
        let field_names = self.icd.field_names();
        let field_count = fields.len();
        let allowed_characters = self.icd.data_format().allowed_characters();

        let mut values = BTreeMap::new();
        for (item, field) in row.iter().zip(fields) {
            // Fixed width items carry their padding; strip it before any
            // value level validation.
            let item = if is_fixed { item.trim() } else { item.as_str() };
            if let Some(range) = allowed_characters {
                for ch in item.chars() {
                    if let Err(error) = range.validate("character", i64::from(u32::from(ch))) {
                        return Err(field_reason(
                            field.as_ref(),
                            &FieldValueError::ForbiddenCharacter(error),
                        ));
                    }
                }
            }
            let value = validate_item(field.as_ref(), item, is_fixed)
                .map_err(|error| field_reason(field.as_ref(), &error))?;
            values.insert(field.name().to_string(), value);
        }

        if row.len() > field_count {
            // Surplus items are flagged one position past the last
            // declared field, 1-based.
            let last = field_names.last().map(String::as_str).unwrap_or("");
            return Err(format!(
                "unexpected data after field {last:?} (item {}) must be removed",
                field_count + 1
            ));
        }
        if row.len() < field_count {
            let missing = field_names[row.len()..].join(", ");
            return Err(format!(
                "row must contain items for the following fields: {missing}"
            ));
        }
        Ok(values)
    }

    fn run_row_checks(
        &mut self,
        row_number: u64,
        values: &BTreeMap<String, FieldValue>,
    ) -> RowVerdict {
        for check in self.icd.checks_mut() {
            if let Err(error) = check.check_row(row_number, values) {
                return RowVerdict::Rejected(format!(
                    "row check failed: {:?}: {error}",
                    check.description()
                ));
            }
        }
        RowVerdict::Accepted
    }
}

fn validate_item(
    field: &dyn FieldFormat,
    item: &str,
    is_fixed: bool,
) -> Result<FieldValue, FieldValueError> {
    field.validate_empty(item)?;
    // Fixed width slicing already guarantees the length structurally.
    if !is_fixed {
        field.validate_length(item)?;
    }
    field.validate(item)
}

fn field_reason(field: &dyn FieldFormat, error: &FieldValueError) -> String {
    format!("field {:?} must match format: {error}", field.name())
}
