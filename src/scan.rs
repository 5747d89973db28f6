//! SIMD-accelerated JSON scanning using memchr
//!
//! Byte-level cursor over the input buffer. String bodies are located by
//! jumping to the next quote or backslash with memchr2; escapes and number
//! grammar are validated here, while decoded values are produced lazily by
//! [`unescape`] at access time.

use memchr::{memchr, memchr2};

use crate::error::{Error, Position, Result};

/// A scanned string token. Offsets are absolute; content excludes the quotes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StringToken {
    pub content_start: usize,
    pub content_end: usize,
    pub has_escapes: bool,
}

/// A scanned number token. `end` is exclusive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NumberToken {
    pub start: usize,
    pub end: usize,
    pub is_integer: bool,
}

/// Scanner over the raw input bytes.
pub(crate) struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input.
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Check if we've reached the end.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at the current byte without advancing.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at the byte at an offset from the current position.
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace characters (space, tab, newline, carriage return).
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Position an error at the given offset.
    fn err_at(&self, err: Error, offset: usize) -> Error {
        err.with_position(Position::locate(self.input, offset))
    }

    /// Scan a string token. The cursor must sit on the opening quote; on
    /// success it is left just past the closing quote.
    ///
    /// Validates escape sequences (including surrogate pairing), rejects
    /// raw control characters, and checks the body is UTF-8. The decoded
    /// form is not produced here.
    pub fn scan_string(&mut self, max_len: usize) -> Result<StringToken> {
        let token_start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        let mut has_escapes = false;

        loop {
            let rel = match memchr2(b'"', b'\\', &self.input[self.pos..]) {
                Some(rel) => rel,
                None => {
                    return Err(self.err_at(Error::parse("unterminated string"), token_start));
                }
            };
            let at = self.pos + rel;
            if at - content_start > max_len {
                return Err(self.err_at(
                    Error::memory_limit(format!("string longer than {max_len} bytes")),
                    token_start,
                ));
            }
            if self.input[at] == b'"' {
                let content = &self.input[content_start..at];
                if content.len() > max_len {
                    return Err(self.err_at(
                        Error::memory_limit(format!("string longer than {max_len} bytes")),
                        token_start,
                    ));
                }
                if let Some(ctrl) = content.iter().position(|&b| b < 0x20) {
                    return Err(self.err_at(
                        Error::parse("unescaped control character in string"),
                        content_start + ctrl,
                    ));
                }
                if std::str::from_utf8(content).is_err() {
                    return Err(self.err_at(Error::parse("invalid UTF-8 in string"), token_start));
                }
                self.pos = at + 1;
                return Ok(StringToken {
                    content_start,
                    content_end: at,
                    has_escapes,
                });
            }
            // Backslash: validate the escape, decode later.
            has_escapes = true;
            self.pos = at + 1;
            self.check_escape()?;
        }
    }

    /// Validate one escape sequence; the cursor sits on the byte after the
    /// backslash and is left past the sequence.
    fn check_escape(&mut self) -> Result<()> {
        let at = self.pos;
        match self.peek() {
            None => Err(self.err_at(Error::parse("unterminated string"), at)),
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                self.pos += 1;
                Ok(())
            }
            Some(b'u') => {
                self.pos += 1;
                let high = self.check_hex4()?;
                if (0xD800..=0xDBFF).contains(&high) {
                    // High surrogate must pair with a following \u low surrogate.
                    if self.peek() != Some(b'\\') || self.peek_at(1) != Some(b'u') {
                        return Err(self.err_at(Error::parse("unpaired surrogate escape"), at));
                    }
                    self.pos += 2;
                    let low = self.check_hex4()?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err(self.err_at(Error::parse("unpaired surrogate escape"), at));
                    }
                } else if (0xDC00..=0xDFFF).contains(&high) {
                    return Err(self.err_at(Error::parse("unpaired surrogate escape"), at));
                }
                Ok(())
            }
            Some(_) => Err(self.err_at(Error::parse("invalid escape character"), at)),
        }
    }

    /// Validate 4 hex digits and return their value.
    fn check_hex4(&mut self) -> Result<u16> {
        match hex4(self.input, self.pos) {
            Some(value) => {
                self.pos += 4;
                Ok(value)
            }
            None => Err(self.err_at(
                Error::parse("expected 4 hex digits in unicode escape"),
                self.pos,
            )),
        }
    }

    /// Scan a number token per the JSON grammar: optional minus, integer
    /// part without leading zeros, optional fraction, optional exponent.
    pub fn scan_number(&mut self) -> Result<NumberToken> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.err_at(Error::parse("leading zero in number"), start));
                }
            }
            Some(b'1'..=b'9') => {
                self.pos += 1;
                while let Some(b'0'..=b'9') = self.peek() {
                    self.pos += 1;
                }
            }
            _ => return Err(self.err_at(Error::parse("invalid number"), start)),
        }

        let mut is_integer = true;
        if self.peek() == Some(b'.') {
            is_integer = false;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err_at(Error::parse("expected digit after decimal point"), start));
            }
            while let Some(b'0'..=b'9') = self.peek() {
                self.pos += 1;
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            is_integer = false;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err_at(Error::parse("expected digit in exponent"), start));
            }
            while let Some(b'0'..=b'9') = self.peek() {
                self.pos += 1;
            }
        }

        Ok(NumberToken {
            start,
            end: self.pos,
            is_integer,
        })
    }

    /// Consume an exact literal (`true`, `false`, `null`).
    pub fn expect_literal(&mut self, literal: &'static [u8]) -> Result<()> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.err_at(Error::parse("invalid literal"), self.pos))
        }
    }
}

/// Parse 4 hex digits at `at`, if present.
#[inline]
fn hex4(input: &[u8], at: usize) -> Option<u16> {
    if at + 4 > input.len() {
        return None;
    }
    let mut value: u16 = 0;
    for &b in &input[at..at + 4] {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        value = (value << 4) | digit as u16;
    }
    Some(value)
}

/// Decode the escape sequences of a raw string body.
///
/// The parser has already validated the sequences, so failures here mean
/// the span does not point at a validated string body.
pub(crate) fn unescape(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let rel = match memchr(b'\\', &bytes[i..]) {
            Some(rel) => rel,
            None => {
                out.push_str(&raw[i..]);
                break;
            }
        };
        let at = i + rel;
        out.push_str(&raw[i..at]);
        let decoded_to = decode_escape(raw, at, &mut out)?;
        i = decoded_to;
    }
    Ok(out)
}

/// Decode one escape at `at` (pointing at the backslash) into `out`,
/// returning the offset just past the sequence.
fn decode_escape(raw: &str, at: usize, out: &mut String) -> Result<usize> {
    let bytes = raw.as_bytes();
    let invalid = || Error::parse("invalid escape in string span");
    match bytes.get(at + 1) {
        Some(b'"') => out.push('"'),
        Some(b'\\') => out.push('\\'),
        Some(b'/') => out.push('/'),
        Some(b'b') => out.push('\u{0008}'),
        Some(b'f') => out.push('\u{000C}'),
        Some(b'n') => out.push('\n'),
        Some(b'r') => out.push('\r'),
        Some(b't') => out.push('\t'),
        Some(b'u') => {
            let high = hex4(bytes, at + 2).ok_or_else(invalid)?;
            if (0xD800..=0xDBFF).contains(&high) {
                if bytes.get(at + 6) != Some(&b'\\') || bytes.get(at + 7) != Some(&b'u') {
                    return Err(invalid());
                }
                let low = hex4(bytes, at + 8).ok_or_else(invalid)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(invalid());
                }
                let combined =
                    0x10000 + (((high as u32 - 0xD800) << 10) | (low as u32 - 0xDC00));
                out.push(char::from_u32(combined).ok_or_else(invalid)?);
                return Ok(at + 12);
            }
            if (0xDC00..=0xDFFF).contains(&high) {
                return Err(invalid());
            }
            out.push(char::from_u32(high as u32).ok_or_else(invalid)?);
            return Ok(at + 6);
        }
        _ => return Err(invalid()),
    }
    Ok(at + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::new(b" \r\n\t[1]");
        scanner.skip_whitespace();
        assert_eq!(scanner.peek(), Some(b'['));

        // idempotent at end of input
        let mut scanner = Scanner::new(b"   ");
        scanner.skip_whitespace();
        assert!(scanner.is_eof());
        scanner.skip_whitespace();
        assert!(scanner.is_eof());
    }

    #[test]
    fn test_scan_string_plain() {
        let mut scanner = Scanner::new(b"\"hello\" rest");
        let token = scanner.scan_string(usize::MAX).unwrap();
        assert_eq!(token.content_start, 1);
        assert_eq!(token.content_end, 6);
        assert!(!token.has_escapes);
        assert_eq!(scanner.position(), 7);
    }

    #[test]
    fn test_scan_string_with_escapes() {
        let mut scanner = Scanner::new(br#""a\n\"b""#);
        let token = scanner.scan_string(usize::MAX).unwrap();
        assert!(token.has_escapes);
        assert!(scanner.is_eof());
    }

    #[test]
    fn test_scan_string_unterminated() {
        let mut scanner = Scanner::new(b"\"abc");
        let err = scanner.scan_string(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_scan_string_control_character() {
        let mut scanner = Scanner::new(b"\"a\nb\"");
        let err = scanner.scan_string(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_scan_string_too_long() {
        let mut scanner = Scanner::new(b"\"abcdef\"");
        let err = scanner.scan_string(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemoryLimit);
    }

    #[test]
    fn test_scan_string_surrogate_pair() {
        let input = "\"\\uD83D\\uDE00\"";
        let mut scanner = Scanner::new(input.as_bytes());
        let token = scanner.scan_string(usize::MAX).unwrap();
        assert!(token.has_escapes);
        assert_eq!(token.content_end, input.len() - 1);
    }

    #[test]
    fn test_scan_string_unpaired_surrogate() {
        let mut scanner = Scanner::new(br#""\uD83D""#);
        let err = scanner.scan_string(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_scan_string_bad_escape() {
        let mut scanner = Scanner::new(br#""\q""#);
        assert!(scanner.scan_string(usize::MAX).is_err());
    }

    #[test]
    fn test_scan_number_integer() {
        let mut scanner = Scanner::new(b"-123,");
        let token = scanner.scan_number().unwrap();
        assert_eq!(token.start, 0);
        assert_eq!(token.end, 4);
        assert!(token.is_integer);
    }

    #[test]
    fn test_scan_number_float_and_exponent() {
        let mut scanner = Scanner::new(b"1.5e-3]");
        let token = scanner.scan_number().unwrap();
        assert_eq!(token.end, 6);
        assert!(!token.is_integer);
    }

    #[test]
    fn test_scan_number_leading_zero_rejected() {
        let mut scanner = Scanner::new(b"012");
        assert!(scanner.scan_number().is_err());
    }

    #[test]
    fn test_scan_number_bare_fraction_rejected() {
        let mut scanner = Scanner::new(b"1.");
        assert!(scanner.scan_number().is_err());
    }

    #[test]
    fn test_expect_literal() {
        let mut scanner = Scanner::new(b"true,");
        scanner.expect_literal(b"true").unwrap();
        assert_eq!(scanner.peek(), Some(b','));

        let mut scanner = Scanner::new(b"tru");
        assert!(scanner.expect_literal(b"true").is_err());
    }

    #[test]
    fn test_unescape_plain_passthrough() {
        assert_eq!(unescape("hello").unwrap(), "hello");
    }

    #[test]
    fn test_unescape_simple_escapes() {
        assert_eq!(unescape(r#"a\n\t\"b\\"#).unwrap(), "a\n\t\"b\\");
        assert_eq!(unescape(r#"\/"#).unwrap(), "/");
    }

    #[test]
    fn test_unescape_unicode() {
        assert_eq!(unescape("A\\u00e9").unwrap(), "Aé");
    }

    #[test]
    fn test_unescape_surrogate_pair() {
        assert_eq!(unescape("\\uD83D\\uDE00").unwrap(), "😀");
    }
}
