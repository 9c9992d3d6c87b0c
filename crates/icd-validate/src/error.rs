use thiserror::Error;

use icd_ingest::ParseError;
use icd_schema::SchemaError;

/// Terminating failure of a validation run.
///
/// Field value and check failures never show up here; they become
/// rejection events and the run completes. Only a broken schema, a
/// structural parse failure, or an unreadable file terminate a run.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
