//! Delimited text parsing with configurable or auto detected delimiters.
//!
//! Quoting follows the quote-at-start rule: an item is quoted only when its
//! first character is the quote character; until the matching closing quote
//! neither the item delimiter nor the line delimiter is recognized. An
//! escape character immediately before a quote inside a quoted item yields
//! a literal quote. An item that opens a quote and never closes it is a
//! structural error.
//!
//! Blank lines yield an empty row (zero items); a single trailing blank
//! line at end of stream yields no row. Leading and trailing item
//! delimiters yield empty string items.

use std::io::Read;

use icd_model::{DataFormat, Delimiter, LineEnding, Row};

use crate::decode::{CharReader, Chars};
use crate::error::ParseError;

/// Candidate item delimiters probed during auto detection, in order.
const ITEM_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// How many characters of the lead are scanned for auto detection.
const DETECT_SCAN_LIMIT: usize = 16 * 1024;

/// Delimiter configuration of a delimited stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub item_delimiter: Delimiter,
    pub line_ending: LineEnding,
    pub quote: Option<char>,
    pub escape: Option<char>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            item_delimiter: Delimiter::Auto,
            line_ending: LineEnding::Auto,
            quote: Some('"'),
            escape: Some('"'),
        }
    }
}

impl Dialect {
    pub fn from_format(format: &DataFormat) -> Self {
        Self {
            item_delimiter: format.item_delimiter(),
            line_ending: format.line_delimiter(),
            quote: format.quote_character(),
            escape: format.escape_character(),
        }
    }
}

/// Scan the lead characters for the first line ending and fix it for the
/// whole stream. Streams without any line ending default to LF, which
/// never matches and therefore does not matter.
pub(crate) fn detect_line_ending<R: Read>(chars: &mut Chars<R>) -> Result<LineEnding, ParseError> {
    for index in 0..DETECT_SCAN_LIMIT {
        match chars.peek_nth(index)? {
            Some('\r') => {
                return Ok(match chars.peek_nth(index + 1)? {
                    Some('\n') => LineEnding::CrLf,
                    _ => LineEnding::Cr,
                });
            }
            Some('\n') => return Ok(LineEnding::Lf),
            Some(_) => {}
            None => break,
        }
    }
    Ok(LineEnding::Lf)
}

/// Scan the first line for the first candidate item delimiter. Single
/// column streams default to comma.
fn detect_item_delimiter<R: Read>(
    chars: &mut Chars<R>,
    line_ending: LineEnding,
) -> Result<char, ParseError> {
    for index in 0..DETECT_SCAN_LIMIT {
        match chars.peek_nth(index)? {
            Some(ch) if ITEM_CANDIDATES.contains(&ch) => return Ok(ch),
            Some('\n') if matches!(line_ending, LineEnding::Lf) => break,
            Some('\r') if !matches!(line_ending, LineEnding::Lf) => break,
            Some(_) => {}
            None => break,
        }
    }
    Ok(',')
}

/// Lazy reader over a delimited character stream.
pub struct DelimitedReader<R: Read> {
    chars: Chars<R>,
    item_delimiter: char,
    line_ending: LineEnding,
    quote: Option<char>,
    escape: Option<char>,
    /// One row of read-ahead, so a trailing empty row can be dropped.
    pending: Option<Row>,
    row_number: u64,
    done: bool,
}

impl<R: Read> DelimitedReader<R> {
    /// Build a reader, resolving any auto detected delimiters from the
    /// stream's lead characters. The stream itself is not consumed.
    pub fn new(reader: CharReader<R>, dialect: Dialect) -> Result<Self, ParseError> {
        let mut chars = Chars::new(reader);
        let line_ending = match dialect.line_ending {
            LineEnding::Auto => detect_line_ending(&mut chars)?,
            explicit => explicit,
        };
        let item_delimiter = match dialect.item_delimiter {
            Delimiter::Auto => detect_item_delimiter(&mut chars, line_ending)?,
            Delimiter::Char(ch) => ch,
        };
        Ok(Self {
            chars,
            item_delimiter,
            line_ending,
            quote: dialect.quote,
            escape: dialect.escape,
            pending: None,
            row_number: 0,
            done: false,
        })
    }

    /// The line ending in effect after auto detection.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// The item delimiter in effect after auto detection.
    pub fn item_delimiter(&self) -> char {
        self.item_delimiter
    }

    /// True when the next characters form the line ending; consumes them.
    fn consume_line_ending(&mut self, ch: char) -> Result<bool, ParseError> {
        match self.line_ending {
            LineEnding::Lf => Ok(ch == '\n'),
            LineEnding::Cr => Ok(ch == '\r'),
            LineEnding::CrLf => {
                if ch == '\r' && self.chars.peek()? == Some('\n') {
                    self.chars.next()?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            LineEnding::Auto => unreachable!("auto line ending resolved in new()"),
        }
    }

    /// Produce the next physical row, without the trailing blank handling.
    /// `Ok(None)` means end of stream with no further row.
    fn raw_next_row(&mut self) -> Result<Option<Row>, ParseError> {
        let mut items: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut line_has_content = false;
        let mut in_quote = false;
        let mut item_was_quoted = false;
        self.row_number += 1;

        loop {
            let Some(ch) = self.chars.next()? else {
                if in_quote {
                    return Err(ParseError::UnterminatedQuote {
                        row: self.row_number,
                    });
                }
                if line_has_content {
                    items.push(current);
                    return Ok(Some(items));
                }
                return Ok(None);
            };

            if in_quote {
                if Some(ch) == self.escape
                    && self.escape != self.quote
                    && self.chars.peek()? == self.quote
                {
                    // Escaped quote inside a quoted item.
                    if let Some(quote) = self.chars.next()? {
                        current.push(quote);
                    }
                } else if Some(ch) == self.quote {
                    if self.escape == self.quote && self.chars.peek()? == self.quote {
                        // Doubled quote stands for a literal quote.
                        self.chars.next()?;
                        current.push(ch);
                    } else {
                        in_quote = false;
                    }
                } else {
                    // Delimiters and line endings are literal inside quotes.
                    current.push(ch);
                }
                continue;
            }

            if Some(ch) == self.quote && current.is_empty() && !item_was_quoted {
                in_quote = true;
                item_was_quoted = true;
                line_has_content = true;
            } else if ch == self.item_delimiter {
                items.push(std::mem::take(&mut current));
                item_was_quoted = false;
                line_has_content = true;
            } else if self.consume_line_ending(ch)? {
                if !line_has_content {
                    return Ok(Some(Vec::new()));
                }
                items.push(current);
                return Ok(Some(items));
            } else {
                current.push(ch);
                line_has_content = true;
            }
        }
    }
}

impl<R: Read> Iterator for DelimitedReader<R> {
    type Item = Result<Row, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.raw_next_row() {
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
                Ok(Some(row)) => {
                    if let Some(ready) = self.pending.replace(row) {
                        return Some(Ok(ready));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    // A trailing blank line produces no row.
                    return match self.pending.take() {
                        Some(row) if !row.is_empty() => Some(Ok(row)),
                        _ => None,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::resolve_encoding;

    fn reader_for(text: &'static str, dialect: Dialect) -> DelimitedReader<&'static [u8]> {
        let encoding = resolve_encoding("utf-8").expect("encoding");
        DelimitedReader::new(CharReader::new(text.as_bytes(), encoding), dialect)
            .expect("build reader")
    }

    fn rows_of(text: &'static str, dialect: Dialect) -> Vec<Row> {
        reader_for(text, dialect)
            .collect::<Result<Vec<_>, _>>()
            .expect("parse rows")
    }

    fn lf_dialect() -> Dialect {
        Dialect {
            item_delimiter: Delimiter::Char(','),
            line_ending: LineEnding::Lf,
            ..Dialect::default()
        }
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert_eq!(rows_of("", lf_dialect()), Vec::<Row>::new());
    }

    #[test]
    fn single_char() {
        assert_eq!(rows_of("x", lf_dialect()), vec![vec!["x"]]);
    }

    #[test]
    fn quoted_delimiter_is_literal() {
        assert_eq!(rows_of("x,\",\",y", lf_dialect()), vec![vec!["x", ",", "y"]]);
    }

    #[test]
    fn leading_delimiter_yields_empty_item() {
        assert_eq!(rows_of(",x", lf_dialect()), vec![vec!["", "x"]]);
        assert_eq!(rows_of(",", lf_dialect()), vec![vec!["", ""]]);
    }

    #[test]
    fn empty_items_before_line_ending() {
        assert_eq!(rows_of(",\nx", lf_dialect()), vec![vec!["", ""], vec!["x"]]);
    }

    #[test]
    fn quoted_items() {
        assert_eq!(rows_of("\"x\"", lf_dialect()), vec![vec!["x"]]);
        assert_eq!(rows_of("\"hugo\",\"was\",\"here\"", lf_dialect()), vec![vec![
            "hugo", "was", "here"
        ]]);
        assert_eq!(rows_of("hugo,\"was\",here", lf_dialect()), vec![vec![
            "hugo", "was", "here"
        ]]);
    }

    #[test]
    fn doubled_quote_is_literal() {
        assert_eq!(rows_of("\"a\"\"b\"", lf_dialect()), vec![vec!["a\"b"]]);
    }

    #[test]
    fn backslash_escape() {
        let dialect = Dialect {
            escape: Some('\\'),
            ..lf_dialect()
        };
        assert_eq!(rows_of("\"a\\\"b\"", dialect), vec![vec!["a\"b"]]);
    }

    #[test]
    fn line_ending_inside_quote_is_literal() {
        assert_eq!(rows_of("\"a\nb\",c", lf_dialect()), vec![vec!["a\nb", "c"]]);
    }

    #[test]
    fn multiple_lines() {
        assert_eq!(rows_of("a\nb,c", lf_dialect()), vec![vec!["a"], vec![
            "b", "c"
        ]]);
    }

    #[test]
    fn blank_line_in_the_middle_yields_empty_row() {
        let rows = rows_of("a\n\nb,c", lf_dialect());
        assert_eq!(rows, vec![vec!["a".to_string()], vec![], vec![
            "b".to_string(),
            "c".to_string()
        ]]);
    }

    #[test]
    fn trailing_blank_line_yields_no_row() {
        assert_eq!(rows_of("\n", lf_dialect()), Vec::<Row>::new());
        assert_eq!(rows_of("a\n", lf_dialect()), vec![vec!["a"]]);
        assert_eq!(rows_of("a\n\n", lf_dialect()), vec![vec!["a"]]);
    }

    #[test]
    fn unterminated_quote_is_structural() {
        let mut reader = reader_for("\"", lf_dialect());
        assert!(matches!(
            reader.next(),
            Some(Err(ParseError::UnterminatedQuote { row: 1 }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn auto_detects_crlf_and_comma() {
        let dialect = Dialect::default();
        let reader = reader_for("a,b\r\nc,d,e\r\n", dialect);
        assert_eq!(reader.line_ending(), LineEnding::CrLf);
        assert_eq!(reader.item_delimiter(), ',');
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().expect("rows");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d", "e"]]);
    }

    #[test]
    fn auto_detects_semicolon() {
        let reader = reader_for("some;items;using;a;semicolon", Dialect::default());
        assert_eq!(reader.item_delimiter(), ';');
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 5);
    }

    #[test]
    fn explicit_cr_line_ending() {
        let dialect = Dialect {
            line_ending: LineEnding::Cr,
            ..lf_dialect()
        };
        assert_eq!(rows_of("\r", dialect), Vec::<Row>::new());
        assert_eq!(rows_of("a\rb", dialect), vec![vec!["a"], vec!["b"]]);
    }
}
