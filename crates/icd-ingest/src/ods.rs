//! Reader for zip based spreadsheets (ODS).
//!
//! The sheet is decoded up front: the zip entry has to be decompressed and
//! the XML walked to find row boundaries anyway, so there is nothing to
//! gain from lazy decoding here. Iteration over the decoded rows stays
//! lazy like every other row source.
//!
//! Numeric and date cells are stringified: `office:value` style attributes
//! win over the display text, and whole valued floats render without a
//! fraction part (`42`, not `42.0`).

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use icd_model::{Row, SheetSelector};

use crate::error::ParseError;

/// Upper bound honoured for `number-columns-repeated` and
/// `number-rows-repeated`, so padding declarations cannot balloon memory.
const REPEAT_CAP: usize = 10_000;

pub struct OdsReader {
    rows: std::vec::IntoIter<Row>,
}

impl OdsReader {
    pub fn open(path: &Path, sheet: &SheetSelector) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::from_archive(zip::ZipArchive::new(file).map_err(spreadsheet_error)?, sheet)
    }

    /// Read from an in-memory zip archive.
    pub fn from_bytes(bytes: Vec<u8>, sheet: &SheetSelector) -> Result<Self, ParseError> {
        Self::from_archive(
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(spreadsheet_error)?,
            sheet,
        )
    }

    fn from_archive<R: Read + Seek>(
        mut archive: zip::ZipArchive<R>,
        sheet: &SheetSelector,
    ) -> Result<Self, ParseError> {
        let mut content = Vec::new();
        archive
            .by_name("content.xml")
            .map_err(|_| ParseError::Spreadsheet("archive has no content.xml".to_string()))?
            .read_to_end(&mut content)?;
        let rows = read_sheet_rows(&content, sheet)?;
        Ok(Self {
            rows: rows.into_iter(),
        })
    }
}

impl Iterator for OdsReader {
    type Item = Result<Row, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }
}

fn spreadsheet_error(error: impl std::fmt::Display) -> ParseError {
    ParseError::Spreadsheet(error.to_string())
}

fn sheet_not_found(sheet: &SheetSelector) -> ParseError {
    match sheet {
        SheetSelector::Index(index) => ParseError::SheetNotFound(format!("index {index}")),
        SheetSelector::Name(name) => ParseError::SheetNotFound(format!("{name:?}")),
    }
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(spreadsheet_error)?;
        if attribute.key.as_ref() == name.as_bytes() {
            return Ok(Some(
                attribute
                    .unescape_value()
                    .map_err(spreadsheet_error)?
                    .into_owned(),
            ));
        }
    }
    Ok(None)
}

fn repeat_count(start: &BytesStart<'_>, name: &str) -> Result<usize, ParseError> {
    let count = attribute(start, name)?
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(1);
    Ok(count.clamp(1, REPEAT_CAP))
}

/// Render a float the way a spreadsheet user wrote it: whole values
/// without a fraction part.
fn format_float(text: &str) -> String {
    match text.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => text.to_string(),
    }
}

/// The typed value attribute of a cell, if any; display text is the
/// fallback for plain string cells.
fn cell_value(start: &BytesStart<'_>) -> Result<Option<String>, ParseError> {
    let value_type = attribute(start, "office:value-type")?;
    let value = match value_type.as_deref() {
        Some("float") | Some("percentage") | Some("currency") => {
            attribute(start, "office:value")?.map(|text| format_float(&text))
        }
        Some("date") => attribute(start, "office:date-value")?,
        Some("time") => attribute(start, "office:time-value")?,
        Some("boolean") => attribute(start, "office:boolean-value")?,
        _ => None,
    };
    Ok(value)
}

struct CellState {
    value: Option<String>,
    text: String,
    repeat: usize,
    first_paragraph: bool,
}

fn selector_matches(sheet: &SheetSelector, index: usize, name: Option<&str>) -> bool {
    match sheet {
        SheetSelector::Index(wanted) => *wanted == index,
        SheetSelector::Name(wanted) => name == Some(wanted.as_str()),
    }
}

fn read_sheet_rows(content: &[u8], sheet: &SheetSelector) -> Result<Vec<Row>, ParseError> {
    let mut reader = Reader::from_reader(content);
    let mut buffer = Vec::new();

    let mut sheet_index = 0usize;
    let mut in_target = false;
    let mut found = false;
    let mut rows: Vec<Row> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut row_repeat = 1usize;
    let mut cell: Option<CellState> = None;

    loop {
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(spreadsheet_error)?;
        match event {
            Event::Eof => break,
            Event::Start(ref start) => match start.name().as_ref() {
                b"table:table" => {
                    sheet_index += 1;
                    let name = attribute(start, "table:name")?;
                    in_target = selector_matches(sheet, sheet_index, name.as_deref());
                }
                b"table:table-row" if in_target => {
                    row.clear();
                    row_repeat = repeat_count(start, "table:number-rows-repeated")?;
                }
                b"table:table-cell" | b"table:covered-table-cell" if in_target => {
                    cell = Some(CellState {
                        value: cell_value(start)?,
                        text: String::new(),
                        repeat: repeat_count(start, "table:number-columns-repeated")?,
                        first_paragraph: true,
                    });
                }
                b"text:p" => {
                    if let Some(state) = cell.as_mut() {
                        if !state.first_paragraph {
                            state.text.push('\n');
                        }
                        state.first_paragraph = false;
                    }
                }
                _ => {}
            },
            Event::Empty(ref start) => match start.name().as_ref() {
                b"table:table" => {
                    sheet_index += 1;
                    let name = attribute(start, "table:name")?;
                    if selector_matches(sheet, sheet_index, name.as_deref()) {
                        found = true;
                    }
                }
                b"table:table-cell" | b"table:covered-table-cell" if in_target => {
                    let value = cell_value(start)?.unwrap_or_default();
                    let repeat = repeat_count(start, "table:number-columns-repeated")?;
                    for _ in 0..repeat {
                        row.push(value.clone());
                    }
                }
                b"table:table-row" if in_target => {
                    // A row without any cells; an empty row.
                    let repeat = repeat_count(start, "table:number-rows-repeated")?;
                    for _ in 0..repeat {
                        rows.push(Vec::new());
                    }
                }
                b"text:s" => {
                    if let Some(state) = cell.as_mut() {
                        let count = attribute(start, "text:c")?
                            .and_then(|value| value.parse::<usize>().ok())
                            .unwrap_or(1)
                            .min(REPEAT_CAP);
                        state.text.extend(std::iter::repeat_n(' ', count));
                    }
                }
                b"text:tab" => {
                    if let Some(state) = cell.as_mut() {
                        state.text.push('\t');
                    }
                }
                _ => {}
            },
            Event::End(ref end) => match end.name().as_ref() {
                b"table:table" => {
                    if in_target {
                        found = true;
                        break;
                    }
                }
                b"table:table-row" if in_target => {
                    // Trailing empty cells are sheet padding, not items.
                    while row.last().is_some_and(|item| item.is_empty()) {
                        row.pop();
                    }
                    for _ in 0..row_repeat {
                        rows.push(row.clone());
                    }
                    row_repeat = 1;
                }
                b"table:table-cell" | b"table:covered-table-cell" => {
                    if let Some(state) = cell.take() {
                        let value = state.value.unwrap_or(state.text);
                        for _ in 0..state.repeat {
                            row.push(value.clone());
                        }
                    }
                }
                _ => {}
            },
            Event::Text(ref text) => {
                if let Some(state) = cell.as_mut() {
                    state
                        .text
                        .push_str(&text.xml_content().map_err(spreadsheet_error)?);
                }
            }
            _ => {}
        }
        buffer.clear();
    }

    if !found {
        return Err(sheet_not_found(sheet));
    }
    // Trailing empty rows are sheet padding.
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    Ok(rows)
}
