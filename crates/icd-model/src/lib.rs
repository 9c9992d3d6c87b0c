pub mod data_format;
pub mod error;
pub mod outcome;
pub mod ranges;
pub mod value;

pub use data_format::{DataFormat, Delimiter, FormatKind, LineEnding, SheetSelector};
pub use error::{DataFormatError, RangeError};
pub use outcome::{EndCheckFailure, RowIssue, RunTotals};
pub use ranges::Range;
pub use value::FieldValue;

/// Ordered sequence of string items as produced by a row source. Its width
/// need not match the declared field count; the validation engine checks
/// that per row.
pub type Row = Vec<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_reset_clears_counts() {
        let mut totals = RunTotals {
            accepted_rows: 3,
            rejected_rows: 1,
            passed_checks_at_end: 2,
            failed_checks_at_end: 1,
        };
        totals.reset();
        assert_eq!(totals, RunTotals::default());
        assert_eq!(totals.row_count(), 0);
    }

    #[test]
    fn row_issue_serializes() {
        let issue = RowIssue {
            row_number: 4,
            items: vec!["a".to_string(), "b".to_string()],
            reason: "field 'branch_id' must match format".to_string(),
        };
        let json = serde_json::to_string(&issue).expect("serialize issue");
        let round: RowIssue = serde_json::from_str(&json).expect("deserialize issue");
        assert_eq!(round.row_number, 4);
        assert_eq!(round.items.len(), 2);
    }
}
