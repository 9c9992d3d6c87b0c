pub mod engine;
pub mod error;
pub mod listener;
pub mod report;

pub use engine::{RowVerdict, Validator};
pub use error::ValidateError;
pub use listener::{CollectingListener, ValidationListener};
pub use report::{RunReport, write_run_report_json};
