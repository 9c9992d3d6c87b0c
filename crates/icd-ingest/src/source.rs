//! Row source selection: one function per entry point that picks the
//! parser matching a declared data format or an auto detected container.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use icd_model::{DataFormat, FormatKind, Row, SheetSelector};

use crate::decode::{CharReader, resolve_encoding};
use crate::delimited::{DelimitedReader, Dialect};
use crate::detection::{ContainerKind, detect_container_at};
use crate::error::ParseError;
use crate::fixed::FixedReader;
use crate::ods::OdsReader;
use crate::provider::SheetProvider;

/// A lazy, finite, forward only stream of rows. Not restartable; reopen
/// the underlying file for another pass.
pub type RowStream = Box<dyn Iterator<Item = Result<Row, ParseError>>>;

fn open_delimited(path: &Path, encoding_label: &str, dialect: Dialect) -> Result<RowStream, ParseError> {
    let encoding = resolve_encoding(encoding_label)?;
    let file = BufReader::new(File::open(path)?);
    let reader = DelimitedReader::new(CharReader::new(file, encoding), dialect)?;
    debug!(
        item_delimiter = %reader.item_delimiter(),
        line_ending = ?reader.line_ending(),
        "opened delimited source"
    );
    Ok(Box::new(reader))
}

fn open_provided(
    path: &Path,
    sheet: &SheetSelector,
    provider: Option<&dyn SheetProvider>,
) -> Result<RowStream, ParseError> {
    let provider = provider.ok_or(ParseError::NoSheetProvider)?;
    let rows = provider.read_sheet(path, sheet)?;
    Ok(Box::new(rows.into_iter().map(Ok)))
}

/// Open `path` as declared by `format`. `fixed_widths` carries the exact
/// field widths and is only consulted for fixed width formats.
///
/// For delimited formats the stream is still sniffed first: a data file
/// that turns out to be a spreadsheet container is read as one rather than
/// parsed as text.
pub fn open_data_rows(
    format: &DataFormat,
    path: &Path,
    fixed_widths: &[usize],
    provider: Option<&dyn SheetProvider>,
) -> Result<RowStream, ParseError> {
    match format.kind() {
        FormatKind::FixedWidth => {
            let encoding = resolve_encoding(format.encoding())?;
            let file = BufReader::new(File::open(path)?);
            let reader = FixedReader::new(
                CharReader::new(file, encoding),
                fixed_widths.to_vec(),
                format.line_delimiter(),
            )?;
            Ok(Box::new(reader))
        }
        FormatKind::Delimited => match detect_container_at(path)? {
            ContainerKind::Text => {
                open_delimited(path, format.encoding(), Dialect::from_format(format))
            }
            ContainerKind::SpreadsheetZip => {
                Ok(Box::new(OdsReader::open(path, &SheetSelector::default())?))
            }
            ContainerKind::SpreadsheetBinary => {
                open_provided(path, &SheetSelector::default(), provider)
            }
        },
        FormatKind::SpreadsheetZip => Ok(Box::new(OdsReader::open(path, format.sheet())?)),
        FormatKind::SpreadsheetBinary => open_provided(path, format.sheet(), provider),
    }
}

/// Open `path` with full auto detection, as used for reading an ICD
/// itself: container by magic number, text as delimited with auto
/// detected delimiters and utf-8 decoding.
pub fn open_auto_rows(
    path: &Path,
    provider: Option<&dyn SheetProvider>,
) -> Result<RowStream, ParseError> {
    match detect_container_at(path)? {
        ContainerKind::Text => open_delimited(path, "utf-8", Dialect::default()),
        ContainerKind::SpreadsheetZip => {
            Ok(Box::new(OdsReader::open(path, &SheetSelector::default())?))
        }
        ContainerKind::SpreadsheetBinary => {
            open_provided(path, &SheetSelector::default(), provider)
        }
    }
}
