//! Index builder - single-scan JSON parse
//!
//! Recursive descent over the scanner, appending one entry per value in
//! document order. Scalars are validated but not decoded; containers record
//! parent links that the child tables are built from afterwards.

use crate::error::{Error, Position, Result};
use crate::options::ParseOptions;
use crate::scan::Scanner;

use super::entry::{entry_flags, IndexEntry, ValueKind, NO_NODE};
use super::span::Span;
use super::structural::StructuralIndex;

/// Build the structural index for one JSON value.
pub(crate) fn build_index(input: &[u8], options: &ParseOptions) -> Result<StructuralIndex> {
    if input.len() > u32::MAX as usize {
        return Err(Error::memory_limit("input exceeds 4 GiB"));
    }
    let mut builder = IndexBuilder::new(input, *options);
    builder.parse_document()?;
    Ok(builder.finish())
}

/// Builds the structural index during a single forward scan.
struct IndexBuilder<'a> {
    scanner: Scanner<'a>,
    index: StructuralIndex,
    options: ParseOptions,
    input: &'a [u8],
    depth: u32,
}

impl<'a> IndexBuilder<'a> {
    fn new(input: &'a [u8], options: ParseOptions) -> Self {
        // Capacity heuristic: roughly one value per 12 bytes of input
        let capacity = (input.len() / 12).clamp(8, 1 << 20);
        Self {
            scanner: Scanner::new(input),
            index: StructuralIndex::with_capacity(capacity),
            options,
            input,
            depth: 0,
        }
    }

    fn parse_document(&mut self) -> Result<()> {
        self.scanner.skip_whitespace();
        if self.scanner.is_eof() {
            return Err(self.parse_err("empty input"));
        }
        let root = self.parse_value(NO_NODE, Span::empty(), 0)?;
        self.index.set_root(root);

        self.scanner.skip_whitespace();
        if self.options.strict && !self.scanner.is_eof() {
            return Err(self.parse_err("unexpected data after value"));
        }
        Ok(())
    }

    fn finish(mut self) -> StructuralIndex {
        self.index.build_children_from_parents();
        self.index.shrink_to_fit();
        self.index
    }

    /// Parse one value. `key`/`key_flags` carry the member key when the
    /// parent is an object.
    fn parse_value(&mut self, parent: u32, key: Span, key_flags: u8) -> Result<u32> {
        match self.scanner.peek() {
            Some(b'{') => self.parse_object(parent, key, key_flags),
            Some(b'[') => self.parse_array(parent, key, key_flags),
            Some(b'"') => self.parse_string(parent, key, key_flags),
            Some(b'-' | b'0'..=b'9') => self.parse_number(parent, key, key_flags),
            Some(b't') => self.parse_literal(b"true", ValueKind::Bool, parent, key, key_flags),
            Some(b'f') => self.parse_literal(b"false", ValueKind::Bool, parent, key, key_flags),
            Some(b'n') => self.parse_literal(b"null", ValueKind::Null, parent, key, key_flags),
            Some(_) => Err(self.parse_err("unexpected character")),
            None => Err(self.parse_err("unexpected end of input")),
        }
    }

    /// Count one level of container nesting; scalars do not add a level.
    fn enter_container(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(
                Error::depth_limit(self.options.max_depth).with_position(self.position_here())
            );
        }
        Ok(())
    }

    fn parse_object(&mut self, parent: u32, key: Span, key_flags: u8) -> Result<u32> {
        self.enter_container()?;
        let start = self.scanner.position();
        let idx = self.push_entry(ValueKind::Object, start, parent, key, key_flags);
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        if self.scanner.peek() == Some(b'}') {
            self.scanner.advance(1);
            self.close_span(idx, start);
            self.depth -= 1;
            return Ok(idx);
        }

        let mut members = 0usize;
        loop {
            self.scanner.skip_whitespace();
            if self.scanner.peek() != Some(b'"') {
                return Err(self.parse_err("expected object key"));
            }
            let key_token = self.scanner.scan_string(self.options.max_string_len)?;
            let member_key = Span::from_range(key_token.content_start, key_token.content_end);
            let member_flags = if key_token.has_escapes {
                entry_flags::KEY_HAS_ESCAPES
            } else {
                0
            };

            self.scanner.skip_whitespace();
            if self.scanner.peek() != Some(b':') {
                return Err(self.parse_err("expected ':' after object key"));
            }
            self.scanner.advance(1);
            self.scanner.skip_whitespace();
            self.parse_value(idx, member_key, member_flags)?;

            members += 1;
            if members > self.options.max_object_keys {
                return Err(Error::memory_limit(format!(
                    "object exceeds {} members",
                    self.options.max_object_keys
                ))
                .with_position(self.position_here()));
            }

            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                Some(b',') => {
                    self.scanner.advance(1);
                    self.scanner.skip_whitespace();
                    if self.scanner.peek() == Some(b'}') {
                        return Err(self.parse_err("trailing comma in object"));
                    }
                }
                Some(b'}') => {
                    self.scanner.advance(1);
                    break;
                }
                _ => return Err(self.parse_err("expected ',' or '}' in object")),
            }
        }
        self.close_span(idx, start);
        self.depth -= 1;
        Ok(idx)
    }

    fn parse_array(&mut self, parent: u32, key: Span, key_flags: u8) -> Result<u32> {
        self.enter_container()?;
        let start = self.scanner.position();
        let idx = self.push_entry(ValueKind::Array, start, parent, key, key_flags);
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        if self.scanner.peek() == Some(b']') {
            self.scanner.advance(1);
            self.close_span(idx, start);
            self.depth -= 1;
            return Ok(idx);
        }

        let mut items = 0usize;
        loop {
            self.scanner.skip_whitespace();
            self.parse_value(idx, Span::empty(), 0)?;

            items += 1;
            if items > self.options.max_array_items {
                return Err(Error::memory_limit(format!(
                    "array exceeds {} items",
                    self.options.max_array_items
                ))
                .with_position(self.position_here()));
            }

            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                Some(b',') => {
                    self.scanner.advance(1);
                    self.scanner.skip_whitespace();
                    if self.scanner.peek() == Some(b']') {
                        return Err(self.parse_err("trailing comma in array"));
                    }
                }
                Some(b']') => {
                    self.scanner.advance(1);
                    break;
                }
                _ => return Err(self.parse_err("expected ',' or ']' in array")),
            }
        }
        self.close_span(idx, start);
        self.depth -= 1;
        Ok(idx)
    }

    fn parse_string(&mut self, parent: u32, key: Span, key_flags: u8) -> Result<u32> {
        let start = self.scanner.position();
        let token = self.scanner.scan_string(self.options.max_string_len)?;
        let idx = self.push_entry(ValueKind::String, start, parent, key, key_flags);
        if let Some(entry) = self.index.get_mut(idx) {
            entry.span = Span::from_range(start, token.content_end + 1);
            if token.has_escapes {
                entry.flags |= entry_flags::HAS_ESCAPES;
            }
        }
        Ok(idx)
    }

    fn parse_number(&mut self, parent: u32, key: Span, key_flags: u8) -> Result<u32> {
        let token = self.scanner.scan_number()?;
        let idx = self.push_entry(ValueKind::Number, token.start, parent, key, key_flags);
        if let Some(entry) = self.index.get_mut(idx) {
            entry.span = Span::from_range(token.start, token.end);
            if token.is_integer {
                entry.flags |= entry_flags::NUMBER_IS_INTEGER;
            }
        }
        Ok(idx)
    }

    fn parse_literal(
        &mut self,
        literal: &'static [u8],
        kind: ValueKind,
        parent: u32,
        key: Span,
        key_flags: u8,
    ) -> Result<u32> {
        let start = self.scanner.position();
        self.scanner.expect_literal(literal)?;
        let idx = self.push_entry(kind, start, parent, key, key_flags);
        if let Some(entry) = self.index.get_mut(idx) {
            entry.span = Span::from_range(start, start + literal.len());
        }
        Ok(idx)
    }

    fn push_entry(
        &mut self,
        kind: ValueKind,
        start: usize,
        parent: u32,
        key: Span,
        key_flags: u8,
    ) -> u32 {
        let mut entry = IndexEntry::new(kind, start as u32, parent);
        entry.key = key;
        entry.flags = key_flags;
        self.index.add_entry(entry)
    }

    /// Patch a container's span once its closing delimiter is consumed.
    fn close_span(&mut self, idx: u32, start: usize) {
        let end = self.scanner.position();
        if let Some(entry) = self.index.get_mut(idx) {
            entry.span = Span::from_range(start, end);
        }
    }

    fn position_here(&self) -> Position {
        Position::locate(self.input, self.scanner.position())
    }

    fn parse_err(&self, message: &str) -> Error {
        Error::parse(message).with_position(self.position_here())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn build(input: &str) -> Result<StructuralIndex> {
        build_index(input.as_bytes(), &ParseOptions::standard())
    }

    #[test]
    fn test_scalar_root() {
        let index = build("42").unwrap();
        assert_eq!(index.entry_count(), 1);
        let root = index.root().unwrap();
        let entry = index.get(root).unwrap();
        assert_eq!(entry.kind, ValueKind::Number);
        assert!(entry.is_integer_number());
    }

    #[test]
    fn test_string_root() {
        let index = build("\"hi\"").unwrap();
        let entry = index.get(index.root().unwrap()).unwrap();
        assert_eq!(entry.kind, ValueKind::String);
        assert_eq!(entry.span.slice(b"\"hi\""), b"\"hi\"");
    }

    #[test]
    fn test_literals() {
        assert_eq!(build("true").unwrap().kind(0), ValueKind::Bool);
        assert_eq!(build("false").unwrap().kind(0), ValueKind::Bool);
        assert_eq!(build("null").unwrap().kind(0), ValueKind::Null);
    }

    #[test]
    fn test_empty_containers() {
        let index = build("{}").unwrap();
        assert_eq!(index.kind(0), ValueKind::Object);
        assert_eq!(index.child_count(0), 0);

        let index = build("  [ ]  ").unwrap();
        assert_eq!(index.kind(0), ValueKind::Array);
        assert_eq!(index.child_count(0), 0);
    }

    #[test]
    fn test_nested_structure() {
        let input = "{\"a\":{\"b\":[1,2,3]}}";
        let index = build(input).unwrap();
        assert_eq!(index.entry_count(), 6);

        let root = index.root().unwrap();
        assert_eq!(index.child_count(root), 1);

        let a = index.find_member(root, "a", input.as_bytes()).unwrap();
        assert_eq!(index.kind(a), ValueKind::Object);
        let b = index.find_member(a, "b", input.as_bytes()).unwrap();
        assert_eq!(index.kind(b), ValueKind::Array);
        assert_eq!(index.child_count(b), 3);

        let second = index.child_at(b, 1).unwrap();
        assert_eq!(index.get(second).unwrap().span.slice(input.as_bytes()), b"2");
    }

    #[test]
    fn test_container_spans() {
        let input = " {\"a\": [1, 2]} ";
        let index = build(input).unwrap();
        let root = index.root().unwrap();
        assert_eq!(
            index.get(root).unwrap().span.slice(input.as_bytes()),
            b"{\"a\": [1, 2]}"
        );
        let a = index.find_member(root, "a", input.as_bytes()).unwrap();
        assert_eq!(index.get(a).unwrap().span.slice(input.as_bytes()), b"[1, 2]");
    }

    #[test]
    fn test_duplicate_keys_retained() {
        let input = "{\"a\":1,\"a\":2}";
        let index = build(input).unwrap();
        assert_eq!(index.entry_count(), 3);
        assert_eq!(index.child_count(0), 2);

        let found = index.find_member(0, "a", input.as_bytes()).unwrap();
        assert_eq!(index.get(found).unwrap().span.slice(input.as_bytes()), b"2");
    }

    #[test]
    fn test_empty_input() {
        let err = build("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = build("   \n\t ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_trailing_comma_rejected() {
        assert_eq!(build("{\"a\":1,}").unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(build("[1,2,]").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_unquoted_key_rejected() {
        let err = build("{a:1}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_missing_colon_rejected() {
        assert!(build("{\"a\" 1}").is_err());
    }

    #[test]
    fn test_missing_comma_rejected() {
        assert!(build("[1 2]").is_err());
        assert!(build("{\"a\":1 \"b\":2}").is_err());
    }

    #[test]
    fn test_nan_and_infinity_rejected() {
        assert!(build("NaN").is_err());
        assert!(build("Infinity").is_err());
        assert!(build("-Infinity").is_err());
        assert!(build("[1,NaN]").is_err());
    }

    #[test]
    fn test_trailing_data_strict() {
        let err = build("{\"a\":1} extra").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let mut options = ParseOptions::standard();
        options.strict = false;
        let index = build_index(b"{\"a\":1} extra", &options).unwrap();
        assert_eq!(index.kind(index.root().unwrap()), ValueKind::Object);
    }

    #[test]
    fn test_depth_limit() {
        let mut options = ParseOptions::standard();
        options.max_depth = 3;
        let err = build_index(b"[[[[1]]]]", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthLimit);

        assert!(build_index(b"[[1]]", &options).is_ok());
    }

    #[test]
    fn test_object_keys_limit() {
        let mut options = ParseOptions::standard();
        options.max_object_keys = 2;
        let err = build_index(b"{\"a\":1,\"b\":2,\"c\":3}", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemoryLimit);
    }

    #[test]
    fn test_array_items_limit() {
        let mut options = ParseOptions::standard();
        options.max_array_items = 3;
        let err = build_index(b"[1,2,3,4]", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemoryLimit);
    }

    #[test]
    fn test_string_length_limit() {
        let mut options = ParseOptions::standard();
        options.max_string_len = 4;
        let err = build_index(b"{\"key\":\"toolong\"}", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemoryLimit);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = build_index(b"\"\xff\xfe\"", &ParseOptions::standard()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_error_position_line_column() {
        let err = build("{\n  \"a\": 1,\n}").unwrap_err();
        let pos = err.position().unwrap();
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_escaped_key_lookup() {
        let input = "{\"a\\nb\":1}";
        let index = build(input).unwrap();
        assert!(index.find_member(0, "a\nb", input.as_bytes()).is_some());
    }
}
