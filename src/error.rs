//! Error and position types
//!
//! Every failure the library reports is an [`Error`]: a kind, a message,
//! and optionally the source position, extra context, and a cause chain.
//! Line/column positions are computed on demand from byte offsets.

use std::fmt;

use memchr::memchr_iter;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed JSON syntax.
    Parse,
    /// Value exists but a different type was requested.
    TypeMismatch,
    /// Key, index, or path did not resolve to a value.
    NotFound,
    /// A caller-supplied validation rule failed.
    Validation,
    /// Nesting depth exceeded the configured maximum during parse.
    DepthLimit,
    /// A size ceiling (string length, key count, item count) was exceeded during parse.
    MemoryLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::NotFound => "not found",
            ErrorKind::Validation => "validation failed",
            ErrorKind::DepthLimit => "depth limit exceeded",
            ErrorKind::MemoryLimit => "memory limit exceeded",
        };
        f.write_str(name)
    }
}

/// Source location of a byte offset, 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    /// Locate `offset` in `input` by counting line breaks up to it.
    ///
    /// Column is a byte column within the line. Offsets past the end of
    /// input are clamped.
    pub fn locate(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1u32;
        let mut line_start = 0usize;
        for nl in memchr_iter(b'\n', &input[..offset]) {
            line += 1;
            line_start = nl + 1;
        }
        Self {
            line,
            column: (offset - line_start) as u32 + 1,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error value surfaced to callers.
///
/// Strict accessors and the parser return these; the `*_or` accessor family
/// swallows them and substitutes the caller's default instead.
#[derive(Debug, thiserror::Error)]
#[error("{}", render(.kind, .message, .position, .context))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    position: Option<Position>,
    context: Option<String>,
    #[source]
    cause: Option<Box<Error>>,
}

fn render(
    kind: &ErrorKind,
    message: &str,
    position: &Option<Position>,
    context: &Option<String>,
) -> String {
    let mut out = format!("{kind}: {message}");
    if let Some(pos) = position {
        out.push_str(&format!(" at {pos}"));
    }
    if let Some(ctx) = context {
        out.push_str(&format!(" in {ctx}"));
    }
    out
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            context: None,
            cause: None,
        }
    }

    /// Malformed JSON syntax.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Wrong type requested from an existing value.
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Key, index, or path absent.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, what)
    }

    /// Caller-supplied rule failed.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Nesting deeper than the configured maximum.
    pub fn depth_limit(max_depth: u32) -> Self {
        Self::new(
            ErrorKind::DepthLimit,
            format!("nesting exceeds maximum depth {max_depth}"),
        )
    }

    /// A parse-time size ceiling was exceeded.
    pub fn memory_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MemoryLimit, message)
    }

    /// Attach a source position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Attach context, e.g. the field or path being accessed.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach a causing error.
    #[must_use]
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The error classification.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message, without position or context.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source position, if one was recorded.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Context string, if one was recorded.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// The causing error, if any.
    #[inline]
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_first_line() {
        let pos = Position::locate(b"hello", 3);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 4);
        assert_eq!(pos.offset, 3);
    }

    #[test]
    fn test_locate_later_line() {
        let input = b"{\n  \"a\": 1,\n  \"b\": x\n}";
        let offset = input.iter().position(|&b| b == b'x').unwrap();
        let pos = Position::locate(input, offset);
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 8);
    }

    #[test]
    fn test_locate_clamps_offset() {
        let pos = Position::locate(b"ab", 100);
        assert_eq!(pos.offset, 2);
        assert_eq!(pos.column, 3);
    }

    #[test]
    fn test_display_with_position() {
        let err = Error::parse("unexpected trailing comma")
            .with_position(Position::locate(b"{\"a\":1,}", 7));
        let text = err.to_string();
        assert!(text.contains("parse error"));
        assert!(text.contains("trailing comma"));
        assert!(text.contains("line 1, column 8"));
    }

    #[test]
    fn test_display_with_context() {
        let err = Error::type_mismatch("string", "number").with_context("items.0.name");
        let text = err.to_string();
        assert!(text.contains("expected string, found number"));
        assert!(text.contains("items.0.name"));
    }

    #[test]
    fn test_cause_chain() {
        let inner = Error::parse("bad digit");
        let err = Error::validation("age must be numeric").with_cause(inner);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.cause().unwrap().kind(), ErrorKind::Parse);
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("bad digit"));
    }
}
