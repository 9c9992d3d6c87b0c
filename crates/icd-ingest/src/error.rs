use thiserror::Error;

/// Structural failure while reading rows from an input stream.
///
/// All variants abort the enclosing read: once the row boundaries cannot be
/// trusted there is nothing to recover row by row.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown encoding: {0:?}")]
    UnknownEncoding(String),
    #[error("byte stream cannot be decoded as {encoding}")]
    Encoding { encoding: String },
    #[error("item in row {row} must have a closing quote before the end of data")]
    UnterminatedQuote { row: u64 },
    #[error("fixed width row {row} must have at least {expected} characters but has {actual}")]
    LineTooShort {
        row: u64,
        actual: usize,
        expected: usize,
    },
    #[error("cannot read spreadsheet container: {0}")]
    Spreadsheet(String),
    #[error("spreadsheet has no sheet matching {0}")]
    SheetNotFound(String),
    #[error("binary spreadsheet containers need an external sheet provider")]
    NoSheetProvider,
}
