//! Data format declaration: the kind of a tabular input plus the
//! configuration properties scoped to that kind.
//!
//! The format kind is set exactly once per ICD (the first `d` row); every
//! further `d` row sets one property. Unknown properties and properties that
//! do not apply to the chosen kind are rejected at declaration time.

use std::fmt;

use crate::error::DataFormatError;
use crate::ranges::Range;

/// Structural kind of a tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Delimited text (CSV and friends).
    Delimited,
    /// Fixed width text; every field declares an exact width.
    FixedWidth,
    /// Legacy compound document spreadsheet container (Excel).
    SpreadsheetBinary,
    /// Zip based spreadsheet container (ODS).
    SpreadsheetZip,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Delimited => "delimited",
            Self::FixedWidth => "fixed",
            Self::SpreadsheetBinary => "excel",
            Self::SpreadsheetZip => "ods",
        };
        f.write_str(name)
    }
}

/// An item delimiter: either auto detected from the first line or explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Auto,
    Char(char),
}

/// A line ending: either auto detected from the lead bytes or explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Auto,
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// Selects the sheet of a spreadsheet container to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// 1-based sheet index.
    Index(usize),
    /// Sheet name, matched case sensitively.
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        Self::Index(1)
    }
}

const KEY_FORMAT: &str = "format";
const KEY_ENCODING: &str = "encoding";
const KEY_HEADER: &str = "header";
const KEY_ITEM_DELIMITER: &str = "item delimiter";
const KEY_LINE_DELIMITER: &str = "line delimiter";
const KEY_QUOTE_CHARACTER: &str = "quote character";
const KEY_ESCAPE_CHARACTER: &str = "escape character";
const KEY_ALLOWED_CHARACTERS: &str = "allowed characters";
const KEY_SHEET: &str = "sheet";
const KEY_DECIMAL_SEPARATOR: &str = "decimal separator";
const KEY_THOUSANDS_SEPARATOR: &str = "thousands separator";

/// Returns true if the normalized key selects the format kind.
pub fn is_format_key(key: &str) -> bool {
    normalize_key(key) == KEY_FORMAT
}

/// Lowercase a property key and collapse internal whitespace, so
/// `"Line Delimiter"` and `"line  delimiter"` name the same property.
fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Declared data format with kind specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFormat {
    kind: FormatKind,
    encoding: String,
    header_rows: u64,
    item_delimiter: Delimiter,
    line_delimiter: LineEnding,
    quote_character: Option<char>,
    escape_character: Option<char>,
    allowed_characters: Option<Range>,
    sheet: SheetSelector,
    decimal_separator: char,
    thousands_separator: Option<char>,
}

impl DataFormat {
    /// Create a data format of the kind named by `value`, with the kind's
    /// default configuration.
    pub fn for_kind_name(value: &str) -> Result<Self, DataFormatError> {
        let kind = match value.trim().to_lowercase().as_str() {
            "delimited" | "csv" => FormatKind::Delimited,
            "fixed" | "fixed-width" => FormatKind::FixedWidth,
            "excel" | "xls" => FormatKind::SpreadsheetBinary,
            "ods" => FormatKind::SpreadsheetZip,
            _ => return Err(DataFormatError::UnknownKind(value.to_string())),
        };
        Ok(Self::new(kind))
    }

    pub fn new(kind: FormatKind) -> Self {
        Self {
            kind,
            encoding: "utf-8".to_string(),
            header_rows: 0,
            item_delimiter: Delimiter::Auto,
            line_delimiter: LineEnding::Auto,
            quote_character: Some('"'),
            escape_character: Some('"'),
            allowed_characters: None,
            sheet: SheetSelector::default(),
            decimal_separator: '.',
            thousands_separator: None,
        }
    }

    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Number of leading rows that are not validated against the fields.
    pub fn header_rows(&self) -> u64 {
        self.header_rows
    }

    pub fn item_delimiter(&self) -> Delimiter {
        self.item_delimiter
    }

    pub fn line_delimiter(&self) -> LineEnding {
        self.line_delimiter
    }

    pub fn quote_character(&self) -> Option<char> {
        self.quote_character
    }

    pub fn escape_character(&self) -> Option<char> {
        self.escape_character
    }

    pub fn allowed_characters(&self) -> Option<&Range> {
        self.allowed_characters.as_ref()
    }

    pub fn sheet(&self) -> &SheetSelector {
        &self.sheet
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn thousands_separator(&self) -> Option<char> {
        self.thousands_separator
    }

    fn is_text(&self) -> bool {
        matches!(self.kind, FormatKind::Delimited | FormatKind::FixedWidth)
    }

    fn is_spreadsheet(&self) -> bool {
        matches!(
            self.kind,
            FormatKind::SpreadsheetBinary | FormatKind::SpreadsheetZip
        )
    }

    /// Set one configuration property. Keys are matched case insensitively
    /// with collapsed whitespace; values are validated immediately.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DataFormatError> {
        let normalized = normalize_key(key);
        match normalized.as_str() {
            KEY_ENCODING => {
                self.require_text(key)?;
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(bad_value(key, value, "encoding name must not be empty"));
                }
                self.encoding = trimmed.to_lowercase();
            }
            KEY_HEADER => {
                self.header_rows = value.trim().parse::<u64>().map_err(|_| {
                    bad_value(key, value, "header must be a non-negative row count")
                })?;
            }
            KEY_ITEM_DELIMITER => {
                self.require_delimited(key)?;
                self.item_delimiter = parse_item_delimiter(key, value)?;
            }
            KEY_LINE_DELIMITER => {
                self.require_text(key)?;
                self.line_delimiter = parse_line_ending(key, value)?;
            }
            KEY_QUOTE_CHARACTER => {
                self.require_delimited(key)?;
                self.quote_character = parse_optional_char(key, value)?;
            }
            KEY_ESCAPE_CHARACTER => {
                self.require_delimited(key)?;
                self.escape_character = parse_optional_char(key, value)?;
            }
            KEY_ALLOWED_CHARACTERS => {
                self.allowed_characters = Some(Range::new(value)?);
            }
            KEY_SHEET => {
                self.require_spreadsheet(key)?;
                let trimmed = value.trim();
                self.sheet = match trimmed.parse::<usize>() {
                    Ok(0) => {
                        return Err(bad_value(key, value, "sheet index is 1-based"));
                    }
                    Ok(index) => SheetSelector::Index(index),
                    Err(_) if !trimmed.is_empty() => SheetSelector::Name(trimmed.to_string()),
                    Err(_) => {
                        return Err(bad_value(key, value, "sheet must be a name or index"));
                    }
                };
            }
            KEY_DECIMAL_SEPARATOR => {
                self.require_text(key)?;
                self.decimal_separator = parse_single_char(key, value)?;
            }
            KEY_THOUSANDS_SEPARATOR => {
                self.require_text(key)?;
                self.thousands_separator = parse_optional_char(key, value)?;
            }
            KEY_FORMAT => {
                return Err(DataFormatError::BadValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: format!("format is already set to {}", self.kind),
                });
            }
            _ => return Err(DataFormatError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn require_delimited(&self, key: &str) -> Result<(), DataFormatError> {
        if self.kind == FormatKind::Delimited {
            Ok(())
        } else {
            Err(self.not_applicable(key))
        }
    }

    fn require_text(&self, key: &str) -> Result<(), DataFormatError> {
        if self.is_text() {
            Ok(())
        } else {
            Err(self.not_applicable(key))
        }
    }

    fn require_spreadsheet(&self, key: &str) -> Result<(), DataFormatError> {
        if self.is_spreadsheet() {
            Ok(())
        } else {
            Err(self.not_applicable(key))
        }
    }

    fn not_applicable(&self, key: &str) -> DataFormatError {
        DataFormatError::NotApplicable {
            key: key.to_string(),
            kind: self.kind,
        }
    }
}

fn bad_value(key: &str, value: &str, reason: &str) -> DataFormatError {
    DataFormatError::BadValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Strip one level of surrounding quotes, so `","` declares a comma.
fn unquoted(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() >= 3
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

fn named_char(value: &str) -> Option<char> {
    match value.to_lowercase().as_str() {
        "comma" => Some(','),
        "semicolon" => Some(';'),
        "tab" => Some('\t'),
        "pipe" => Some('|'),
        "space" => Some(' '),
        _ => None,
    }
}

fn parse_item_delimiter(key: &str, value: &str) -> Result<Delimiter, DataFormatError> {
    let text = unquoted(value);
    if text.eq_ignore_ascii_case("auto") {
        return Ok(Delimiter::Auto);
    }
    if let Some(named) = named_char(text) {
        return Ok(Delimiter::Char(named));
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(Delimiter::Char(ch)),
        _ => Err(bad_value(
            key,
            value,
            "delimiter must be a single character, a name like 'tab', or 'auto'",
        )),
    }
}

fn parse_line_ending(key: &str, value: &str) -> Result<LineEnding, DataFormatError> {
    match value.trim().to_lowercase().as_str() {
        "auto" => Ok(LineEnding::Auto),
        "lf" | "\n" => Ok(LineEnding::Lf),
        "crlf" | "\r\n" => Ok(LineEnding::CrLf),
        "cr" | "\r" => Ok(LineEnding::Cr),
        _ => Err(bad_value(
            key,
            value,
            "line delimiter must be one of: auto, lf, crlf, cr",
        )),
    }
}

fn parse_single_char(key: &str, value: &str) -> Result<char, DataFormatError> {
    parse_optional_char(key, value)?
        .ok_or_else(|| bad_value(key, value, "a single character is required"))
}

fn parse_optional_char(key: &str, value: &str) -> Result<Option<char>, DataFormatError> {
    let text = unquoted(value);
    if text.is_empty() || text.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if let Some(named) = named_char(text) {
        return Ok(Some(named));
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(Some(ch)),
        _ => Err(bad_value(key, value, "must be a single character or empty")),
    }
}
