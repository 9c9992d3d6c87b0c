use thiserror::Error;

use icd_model::{DataFormatError, FormatKind, RangeError};

use icd_ingest::ParseError;

/// Fatal error while loading an ICD. Nothing is validated when the schema
/// itself is broken.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("ICD row {row}: {source}")]
    DataFormat {
        row: u64,
        #[source]
        source: DataFormatError,
    },
    #[error("ICD row {row}: first item is {marker:?} but must be blank or one of: c, d, f")]
    UnknownMarker { row: u64, marker: String },
    #[error("ICD row {row}: data format row must name a property")]
    MalformedDataFormatRow { row: u64 },
    #[error("ICD row {row}: first data format property must be \"format\" but is {key:?}")]
    FormatNotFirst { row: u64, key: String },
    #[error("ICD row {row}: data format is already set to {kind}")]
    DuplicateFormat { row: u64, kind: FormatKind },
    #[error("ICD row {row}: data format must be declared before the first field")]
    FieldBeforeFormat { row: u64 },
    #[error("ICD row {row}: field row must name a field name, an example, and a type")]
    MalformedFieldRow { row: u64 },
    #[error("ICD row {row}: check row must name a description and a type")]
    MalformedCheckRow { row: u64 },
    #[error("ICD row {row}: field name {name:?} must be a valid identifier")]
    BadFieldName { row: u64, name: String },
    #[error("ICD row {row}: field name {name:?} must be used for only one field")]
    DuplicateField { row: u64, name: String },
    #[error("ICD row {row}: mark for empty field must be \"x\" or blank but is {text:?}")]
    BadEmptyMark { row: u64, text: String },
    #[error("ICD row {row}: length of field {name:?} is malformed: {source}")]
    BadLength {
        row: u64,
        name: String,
        #[source]
        source: RangeError,
    },
    #[error("ICD row {row}: field {name:?} must declare an exact length for fixed width data")]
    MissingFixedWidth { row: u64, name: String },
    #[error("ICD row {row}: example for field {name:?} does not validate: {reason}")]
    BadExample {
        row: u64,
        name: String,
        reason: String,
    },
    #[error("unknown field type: {0:?}")]
    UnknownFieldType(String),
    #[error("unknown check type: {0:?}")]
    UnknownCheckType(String),
    #[error("ICD row {row}: check description {description:?} must be used only once")]
    DuplicateCheck { row: u64, description: String },
    #[error("field {name:?}: {reason}")]
    BadFieldRule { name: String, reason: String },
    #[error("check {description:?}: {reason}")]
    BadCheckRule { description: String, reason: String },
    #[error("ICD must contain a data format section (rows marked with \"d\")")]
    MissingDataFormat,
    #[error("ICD must declare at least one field (rows marked with \"f\")")]
    MissingFields,
}

/// Row level failure of one item against its field format. Recoverable:
/// the engine rejects the row and continues.
#[derive(Debug, Error)]
pub enum FieldValueError {
    #[error("value must not be empty")]
    MustNotBeEmpty,
    #[error("{0}")]
    Length(RangeError),
    #[error("value {value:?} must be an integer number")]
    NotAnInteger { value: String },
    #[error("{0}")]
    IntegerOutOfRange(RangeError),
    #[error("value {value:?} must be a decimal number")]
    NotADecimal { value: String },
    #[error("value {value:?} must match the date pattern {pattern:?}")]
    NotADateTime { value: String, pattern: String },
    #[error("value {value:?} must be one of: {choices}")]
    NotInChoices { value: String, choices: String },
    #[error("value {value:?} must match pattern {pattern:?}")]
    NoPatternMatch { value: String, pattern: String },
    #[error("value must contain only allowed characters: {0}")]
    ForbiddenCharacter(RangeError),
}

/// Row level or end of data failure of a check. Recoverable: the engine
/// rejects the row or records a failed end check and continues.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CheckError {
    message: String,
}

impl CheckError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
