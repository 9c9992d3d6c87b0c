use thiserror::Error;

use crate::data_format::FormatKind;

/// Error raised while declaring or configuring a data format.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("unknown data format: {0:?} (expected one of: delimited, fixed, excel, ods)")]
    UnknownKind(String),
    #[error("unknown data format property: {0:?}")]
    UnknownKey(String),
    #[error("data format property {key:?} does not apply to format {kind}")]
    NotApplicable { key: String, kind: FormatKind },
    #[error("value for data format property {key:?} is invalid: {value:?}: {reason}")]
    BadValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Error raised while parsing a range text or validating a value against it.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("range must be specified as 'value' or 'lower:upper' but is {0:?}")]
    Malformed(String),
    #[error("lower limit {lower} must not be greater than upper limit {upper} in range {text:?}")]
    LimitsSwapped { lower: i64, upper: i64, text: String },
    #[error("{name} is {value} but must be within range {text}")]
    OutOfRange {
        name: String,
        value: i64,
        text: String,
    },
}
