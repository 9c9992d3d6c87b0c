//! End to end validation runs over real files.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use tempfile::TempDir;

use icd_ingest::ParseError;
use icd_schema::IcdLoader;
use icd_validate::{CollectingListener, ValidateError, ValidationListener, Validator};

/// Forwards events into a shared [`CollectingListener`] the test can read
/// after the run, while the validator owns the boxed listener.
struct SharedListener(Rc<RefCell<CollectingListener>>);

impl ValidationListener for SharedListener {
    fn accepted_row(&mut self, row: &[String]) {
        self.0.borrow_mut().accepted_row(row);
    }

    fn rejected_row(&mut self, row: &[String], reason: &str) {
        self.0.borrow_mut().rejected_row(row, reason);
    }

    fn check_at_end_failed(&mut self, description: &str, reason: &str) {
        self.0.borrow_mut().check_at_end_failed(description, reason);
    }
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create file");
    file.write_all(content.as_bytes()).expect("write file");
    path
}

fn validator_for(dir: &TempDir, icd_text: &str) -> Validator {
    let icd_path = write_file(dir, "icd.csv", icd_text);
    let icd = IcdLoader::new().load(&icd_path).expect("load icd");
    Validator::new(icd)
}

const BRANCH_ICD: &str = "\
d,format,delimited\n\
d,header,1\n\
f,branch_id,,integer,,,1:99999\n\
f,amount,,integer,x\n\
";

#[test]
fn accepted_plus_rejected_covers_every_data_row() {
    let dir = TempDir::new().expect("temp dir");
    let mut validator = validator_for(&dir, BRANCH_ICD);
    let data = write_file(
        &dir,
        "data.csv",
        "branch_id,amount\n38000,60\nnot_a_number,1\n38053,\n",
    );
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 2);
    assert_eq!(totals.rejected_rows, 1);
    assert_eq!(totals.row_count(), 3);
}

#[test]
fn empty_rules_follow_the_declared_flag() {
    let dir = TempDir::new().expect("temp dir");
    let mut validator = validator_for(&dir, BRANCH_ICD);
    // amount may be empty, branch_id may not.
    let data = write_file(&dir, "data.csv", "branch_id,amount\n38000,\n,5\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(totals.rejected_rows, 1);
    let issue = &validator.row_issues()[0];
    assert_eq!(issue.row_number, 3);
    assert!(issue.reason.contains("branch_id"));
    assert!(issue.reason.contains("must not be empty"));
}

#[test]
fn quoted_delimiters_survive_validation() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
f,left,,text\n\
f,middle,,text\n\
f,right,,text\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "x,\",\",y\n");
    let collected = Rc::new(RefCell::new(CollectingListener::new()));
    validator.add_listener(Box::new(SharedListener(Rc::clone(&collected))));
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(collected.borrow().accepted, vec![vec!["x", ",", "y"]]);
}

#[test]
fn auto_detected_delimiters_handle_crlf_input() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
d,item delimiter,auto\n\
d,line delimiter,auto\n\
f,a,,text\n\
f,b,,text,x\n\
f,c,,text,x\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "a,b\r\nc,d,e\r\n");
    let totals = validator.validate(&data).expect("run");
    // Both delimiters were detected: two rows, of two and three items.
    // The first row is short one field and is rejected for exactly that.
    assert_eq!(totals.row_count(), 2);
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(totals.rejected_rows, 1);
    assert!(
        validator.row_issues()[0]
            .reason
            .contains("row must contain items for the following fields: c")
    );
}

#[test]
fn fixed_width_rows_are_sliced_and_trimmed() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,fixed\n\
f,branch_id,,integer,,5\n\
f,customer_id,,integer,,4\n\
f,last_name,,text,,10\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.txt", "38000 123Doe       \n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(totals.rejected_rows, 0);
}

#[test]
fn truncated_fixed_width_line_terminates_the_run() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,fixed\n\
f,branch_id,,integer,,5\n\
f,customer_id,,integer,,4\n\
f,last_name,,text,,10\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.txt", "38000 123Doe  ");
    let error = validator.validate(&data).expect_err("structural failure");
    assert!(matches!(
        error,
        ValidateError::Parse(ParseError::LineTooShort { .. })
    ));
}

#[test]
fn surplus_items_are_rejected_after_the_last_field() {
    let dir = TempDir::new().expect("temp dir");
    let mut validator = validator_for(&dir, BRANCH_ICD);
    let data = write_file(&dir, "data.csv", "branch_id,amount\n38000,60,surplus\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.rejected_rows, 1);
    let reason = &validator.row_issues()[0].reason;
    assert!(reason.contains("unexpected data after field \"amount\""));
    assert!(reason.contains("(item 3)"));
}

#[test]
fn missing_items_list_the_missing_fields() {
    let dir = TempDir::new().expect("temp dir");
    let mut validator = validator_for(&dir, BRANCH_ICD);
    let data = write_file(&dir, "data.csv", "branch_id,amount\n38000\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.rejected_rows, 1);
    assert!(
        validator.row_issues()[0]
            .reason
            .contains("row must contain items for the following fields: amount")
    );
}

#[test]
fn uniqueness_check_rejects_the_second_occurrence() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
d,header,1\n\
f,branch_id,,integer\n\
c,branch must be unique,is_unique,branch_id\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "branch_id\n38000\n38053\n38000\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 2);
    assert_eq!(totals.rejected_rows, 1);
    let issue = &validator.row_issues()[0];
    assert_eq!(issue.row_number, 4);
    assert!(issue.reason.contains("branch must be unique"));
}

#[test]
fn repeated_runs_yield_identical_counts() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
f,branch_id,,integer\n\
c,branch must be unique,is_unique,branch_id\n\
c,amounts add up,total,branch_id == 76053\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "38000\n38053\n");
    let first = validator.validate(&data).expect("first run");
    let second = validator.validate(&data).expect("second run");
    assert_eq!(first, second);
    assert_eq!(first.accepted_rows, 2);
    assert_eq!(first.failed_checks_at_end, 0);
    assert_eq!(first.passed_checks_at_end, 2);
}

#[test]
fn failed_total_reports_one_end_check_failure() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
f,amount,,integer\n\
c,amounts add up,total,amount == 100\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "60\n30\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 2);
    assert_eq!(totals.failed_checks_at_end, 1);
    assert_eq!(totals.passed_checks_at_end, 0);
    let failure = &validator.end_check_failures()[0];
    assert_eq!(failure.description, "amounts add up");
    assert!(failure.reason.contains("amounts add up"));
    assert!(failure.reason.contains("90"));
}

#[test]
fn allowed_characters_are_enforced_per_field() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
d,allowed characters,32:126\n\
f,name,,text\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "plain\ncaf\u{e9}\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(totals.rejected_rows, 1);
    let reason = &validator.row_issues()[0].reason;
    assert!(reason.contains("\"name\""));
    assert!(reason.contains("allowed characters"));
}

#[test]
fn listeners_observe_the_full_partition_in_order() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
f,amount,,integer\n\
c,amounts add up,total,amount == 100\n\
";
    let mut validator = validator_for(&dir, icd);
    let collected = Rc::new(RefCell::new(CollectingListener::new()));
    validator.add_listener(Box::new(SharedListener(Rc::clone(&collected))));
    let data = write_file(&dir, "data.csv", "60\nbad\n30\n");
    validator.validate(&data).expect("run");

    let collected = collected.borrow();
    assert_eq!(collected.accepted, vec![vec!["60"], vec!["30"]]);
    assert_eq!(collected.rejected.len(), 1);
    assert_eq!(collected.rejected[0].0, vec!["bad"]);
    assert_eq!(collected.failed_end_checks.len(), 1);
    assert_eq!(collected.failed_end_checks[0].0, "amounts add up");

    // The engine's own record keeping matches what listeners were told.
    assert_eq!(validator.totals().accepted_rows, 2);
    assert_eq!(validator.totals().rejected_rows, 1);
    assert_eq!(validator.row_issues()[0].row_number, 2);
    assert_eq!(validator.end_check_failures().len(), 1);
}

#[test]
fn header_rows_are_not_validated() {
    let dir = TempDir::new().expect("temp dir");
    let icd = "\
d,format,delimited\n\
d,header,2\n\
f,amount,,integer\n\
";
    let mut validator = validator_for(&dir, icd);
    let data = write_file(&dir, "data.csv", "title line\namount\n5\n");
    let totals = validator.validate(&data).expect("run");
    assert_eq!(totals.accepted_rows, 1);
    assert_eq!(totals.rejected_rows, 0);
}
