//! Streaming character decoding on top of `encoding_rs`.
//!
//! Text row sources consume characters one at a time; this module decodes
//! the underlying byte stream incrementally so arbitrarily large inputs
//! never have to be held in memory. Malformed input for the declared
//! encoding is a structural error, not silently replaced.

use std::collections::VecDeque;
use std::io::Read;

use encoding_rs::{Decoder, DecoderResult, Encoding};

use crate::error::ParseError;

const READ_CHUNK: usize = 8 * 1024;

/// Resolve an encoding label (`utf-8`, `iso-8859-1`, ...) to an encoding.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ParseError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ParseError::UnknownEncoding(label.to_string()))
}

/// Incremental character reader over a byte stream.
pub struct CharReader<R: Read> {
    inner: R,
    decoder: Decoder,
    encoding_name: &'static str,
    decoded: VecDeque<char>,
    eof: bool,
}

impl<R: Read> CharReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_with_bom_removal(),
            encoding_name: encoding.name(),
            decoded: VecDeque::new(),
            eof: false,
        }
    }

    /// Next character of the decoded stream, or `None` at end of input.
    pub fn next_char(&mut self) -> Result<Option<char>, ParseError> {
        loop {
            if let Some(ch) = self.decoded.pop_front() {
                return Ok(Some(ch));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<(), ParseError> {
        let mut bytes = [0u8; READ_CHUNK];
        let read = self.inner.read(&mut bytes)?;
        let last = read == 0;
        let src = &bytes[..read];

        let mut out = String::with_capacity(
            self.decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or(READ_CHUNK * 4),
        );
        let mut consumed = 0;
        loop {
            let (result, read_now) =
                self.decoder
                    .decode_to_string_without_replacement(&src[consumed..], &mut out, last);
            consumed += read_now;
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => {
                    out.reserve(READ_CHUNK);
                }
                DecoderResult::Malformed(..) => {
                    return Err(ParseError::Encoding {
                        encoding: self.encoding_name.to_string(),
                    });
                }
            }
        }
        self.decoded.extend(out.chars());
        if last {
            self.eof = true;
        }
        Ok(())
    }
}

/// A [`CharReader`] with unbounded lookahead, shared by the text parsers
/// for delimiter auto detection and one character peeks.
pub struct Chars<R: Read> {
    inner: CharReader<R>,
    pending: VecDeque<char>,
}

impl<R: Read> Chars<R> {
    pub fn new(inner: CharReader<R>) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
        }
    }

    pub fn next(&mut self) -> Result<Option<char>, ParseError> {
        if let Some(ch) = self.pending.pop_front() {
            return Ok(Some(ch));
        }
        self.inner.next_char()
    }

    /// Peek the character `n` positions ahead (0 = the next character).
    pub fn peek_nth(&mut self, n: usize) -> Result<Option<char>, ParseError> {
        while self.pending.len() <= n {
            match self.inner.next_char()? {
                Some(ch) => self.pending.push_back(ch),
                None => return Ok(None),
            }
        }
        Ok(self.pending.get(n).copied())
    }

    pub fn peek(&mut self) -> Result<Option<char>, ParseError> {
        self.peek_nth(0)
    }
}
