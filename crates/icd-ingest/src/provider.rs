//! Seam for legacy binary spreadsheet containers.
//!
//! Compound document spreadsheets (Excel) are detected by magic number but
//! their binary decoding lives outside this crate. A caller that wants to
//! validate such files registers a [`SheetProvider`]; without one, opening
//! a detected container fails with [`ParseError::NoSheetProvider`].

use std::path::Path;

use icd_model::{Row, SheetSelector};

use crate::error::ParseError;

/// External decoder for spreadsheet containers this crate does not parse.
pub trait SheetProvider {
    /// Read the selected sheet of `path` as rows of stringified cells.
    fn read_sheet(&self, path: &Path, sheet: &SheetSelector) -> Result<Vec<Row>, ParseError>;
}
