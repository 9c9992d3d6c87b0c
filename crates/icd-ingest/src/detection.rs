//! Container detection by magic number sniffing.
//!
//! Detection only peeks at the lead bytes; the caller reopens or rewinds the
//! stream so parsing starts at offset zero.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ParseError;

/// Zip local file header, as used by ODS and other zip based containers.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Legacy compound document header, as used by Excel and other older
/// office applications.
const COMPOUND_MAGIC: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];

/// Physical container of a tabular input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain text; delimited unless the data format says fixed width.
    Text,
    /// Zip based spreadsheet container.
    SpreadsheetZip,
    /// Legacy compound document spreadsheet container.
    SpreadsheetBinary,
}

/// Classify a stream by its lead bytes.
pub fn detect_container(lead: &[u8]) -> ContainerKind {
    if lead.starts_with(&ZIP_MAGIC) {
        ContainerKind::SpreadsheetZip
    } else if lead.starts_with(&COMPOUND_MAGIC) {
        ContainerKind::SpreadsheetBinary
    } else {
        ContainerKind::Text
    }
}

/// Classify a file on disk by reading its first bytes.
pub fn detect_container_at(path: &Path) -> Result<ContainerKind, ParseError> {
    let mut file = File::open(path)?;
    let mut lead = [0u8; 8];
    let mut filled = 0;
    while filled < lead.len() {
        let read = file.read(&mut lead[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(detect_container(&lead[..filled]))
}
