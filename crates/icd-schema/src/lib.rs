pub mod checks;
pub mod error;
pub mod fields;
pub mod icd;
pub mod loader;

pub use checks::{
    Check, CheckDeclaration, CheckFactory, CheckRegistry, DistinctCountCheck, FinalRowMarkerCheck,
    IsUniqueCheck, TotalCheck,
};
pub use error::{CheckError, FieldValueError, SchemaError};
pub use fields::{
    ChoiceFieldFormat, DateTimeFieldFormat, DecimalFieldFormat, FieldCommon, FieldFormat,
    FieldFormatFactory, FieldFormatRegistry, IntegerFieldFormat, PatternFieldFormat,
    RegexFieldFormat, TextFieldFormat, UntouchedFieldFormat,
};
pub use icd::Icd;
pub use loader::IcdLoader;
