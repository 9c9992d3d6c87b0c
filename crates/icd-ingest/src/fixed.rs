//! Fixed width text parsing.
//!
//! Every line is sliced left to right into the declared exact widths; no
//! delimiter scanning takes place. A line shorter than the declared total
//! is a structural error, and so is a blank line inside the data (it is a
//! line of width zero). A single trailing blank line at end of stream
//! produces no row, as with delimited input. A line longer than the
//! declared total yields the declared items plus one surplus item holding
//! the remainder; rejecting that surplus is the validation engine's job.

use std::io::Read;

use icd_model::{LineEnding, Row};

use crate::decode::{CharReader, Chars};
use crate::delimited::detect_line_ending;
use crate::error::ParseError;

/// Lazy reader over a fixed width character stream.
pub struct FixedReader<R: Read> {
    chars: Chars<R>,
    widths: Vec<usize>,
    total_width: usize,
    line_ending: LineEnding,
    row_number: u64,
    done: bool,
}

impl<R: Read> FixedReader<R> {
    pub fn new(
        reader: CharReader<R>,
        widths: Vec<usize>,
        line_ending: LineEnding,
    ) -> Result<Self, ParseError> {
        debug_assert!(!widths.is_empty());
        let mut chars = Chars::new(reader);
        let line_ending = match line_ending {
            LineEnding::Auto => detect_line_ending(&mut chars)?,
            explicit => explicit,
        };
        let total_width = widths.iter().sum();
        Ok(Self {
            chars,
            widths,
            total_width,
            line_ending,
            row_number: 0,
            done: false,
        })
    }

    /// Read one physical line, without its line ending. `None` at end of
    /// stream when no characters remain.
    fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        let mut line = String::new();
        let mut terminated = false;
        loop {
            let Some(ch) = self.chars.next()? else {
                break;
            };
            match self.line_ending {
                LineEnding::Lf if ch == '\n' => {
                    terminated = true;
                    break;
                }
                LineEnding::Cr if ch == '\r' => {
                    terminated = true;
                    break;
                }
                LineEnding::CrLf if ch == '\r' && self.chars.peek()? == Some('\n') => {
                    self.chars.next()?;
                    terminated = true;
                    break;
                }
                _ => line.push(ch),
            }
        }
        if line.is_empty() && !terminated {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn slice_line(&mut self, line: &str) -> Result<Row, ParseError> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() < self.total_width {
            return Err(ParseError::LineTooShort {
                row: self.row_number,
                actual: chars.len(),
                expected: self.total_width,
            });
        }
        let mut items = Vec::with_capacity(self.widths.len() + 1);
        let mut offset = 0;
        for width in &self.widths {
            items.push(chars[offset..offset + width].iter().collect());
            offset += width;
        }
        if offset < chars.len() {
            // Surplus characters become one extra item for the engine to
            // reject as unexpected trailing data.
            items.push(chars[offset..].iter().collect());
        }
        Ok(items)
    }

    fn next_row(&mut self) -> Result<Option<Row>, ParseError> {
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        self.row_number += 1;
        if line.is_empty() {
            // Blank line: structural error unless it is the single
            // trailing one.
            return match self.read_line()? {
                None => Ok(None),
                Some(_) => Err(ParseError::LineTooShort {
                    row: self.row_number,
                    actual: 0,
                    expected: self.total_width,
                }),
            };
        }
        self.slice_line(&line).map(Some)
    }
}

impl<R: Read> Iterator for FixedReader<R> {
    type Item = Result<Row, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::resolve_encoding;

    fn reader_for(text: &'static str, widths: &[usize]) -> FixedReader<&'static [u8]> {
        let encoding = resolve_encoding("utf-8").expect("encoding");
        FixedReader::new(
            CharReader::new(text.as_bytes(), encoding),
            widths.to_vec(),
            LineEnding::Auto,
        )
        .expect("build reader")
    }

    fn rows_of(text: &'static str, widths: &[usize]) -> Vec<Row> {
        reader_for(text, widths)
            .collect::<Result<Vec<_>, _>>()
            .expect("parse rows")
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert_eq!(rows_of("", &[5, 4, 10]), Vec::<Row>::new());
    }

    #[test]
    fn slices_exact_widths() {
        assert_eq!(rows_of("38000 123Doe       ", &[5, 4, 10]), vec![vec![
            "38000",
            " 123",
            "Doe       "
        ]]);
    }

    #[test]
    fn too_short_line_is_structural() {
        let mut reader = reader_for("38000 123Doe  ", &[5, 4, 10]);
        assert!(matches!(
            reader.next(),
            Some(Err(ParseError::LineTooShort {
                row: 1,
                actual: 14,
                expected: 19
            }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn surplus_characters_become_extra_item() {
        let rows = rows_of("abcdeXY\n", &[5]);
        assert_eq!(rows, vec![vec!["abcde", "XY"]]);
    }

    #[test]
    fn multiple_lines_with_crlf() {
        let rows = rows_of("ab12\r\ncd34\r\n", &[2, 2]);
        assert_eq!(rows, vec![vec!["ab", "12"], vec!["cd", "34"]]);
    }

    #[test]
    fn trailing_blank_line_is_dropped() {
        assert_eq!(rows_of("ab12\n\n", &[2, 2]), vec![vec!["ab", "12"]]);
    }

    #[test]
    fn inner_blank_line_is_structural() {
        let mut reader = reader_for("ab12\n\ncd34\n", &[2, 2]);
        assert!(matches!(reader.next(), Some(Ok(_))));
        assert!(matches!(
            reader.next(),
            Some(Err(ParseError::LineTooShort {
                actual: 0,
                expected: 4,
                ..
            }))
        ));
    }
}
