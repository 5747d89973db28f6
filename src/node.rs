//! Node - lightweight handle to one value
//!
//! A `Node` is a copyable (document, entry index) pair. Navigation never
//! fails: looking up a missing member, indexing past the end of an array, or
//! descending through a scalar all yield an absent node, and every accessor
//! on an absent node returns its calm default. Only the strict `as_*`
//! getters surface errors.

use std::borrow::Cow;
use std::fmt;

use crate::document::Document;
use crate::error::{Error, Position, Result};
use crate::index::structural::ChildIter;
use crate::index::{IndexEntry, ValueKind, NO_NODE};
use crate::scan::unescape;

/// Handle to a single value inside a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    doc: &'a Document,
    idx: u32,
}

impl<'a> Node<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, idx: u32) -> Self {
        Self { doc, idx }
    }

    #[inline]
    pub(crate) fn absent(doc: &'a Document) -> Self {
        Self { doc, idx: NO_NODE }
    }

    #[inline]
    pub(crate) fn document(&self) -> &'a Document {
        self.doc
    }

    #[inline]
    pub(crate) fn entry_index(&self) -> u32 {
        self.idx
    }

    #[inline]
    fn entry(&self) -> Option<&'a IndexEntry> {
        self.doc.index().get(self.idx)
    }

    /// True when the node refers to a real value in the document.
    #[inline]
    pub fn exists(&self) -> bool {
        self.entry().is_some()
    }

    /// Kind of the value, [`ValueKind::Invalid`] for an absent node.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.doc.index().kind(self.idx)
    }

    /// Raw input text of the value, quotes and all. Empty for an absent node.
    pub fn raw(&self) -> &'a str {
        self.entry()
            .and_then(|e| e.span.as_str(self.doc.bytes()))
            .unwrap_or("")
    }

    /// Number of children for containers, 0 for scalars and absent nodes.
    pub fn len(&self) -> usize {
        self.doc.index().child_count(self.idx)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for a JSON `null` value.
    pub fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    /// Member key under which this value sits in its parent object.
    pub fn key(&self) -> Option<Cow<'a, str>> {
        let entry = self.entry()?;
        if entry.is_root() || self.doc.index().kind(entry.parent) != ValueKind::Object {
            return None;
        }
        let raw = entry.key.as_str(self.doc.bytes())?;
        if entry.key_has_escapes() {
            unescape(raw).ok().map(Cow::Owned)
        } else {
            Some(Cow::Borrowed(raw))
        }
    }

    /// Object member by key. Duplicate keys resolve to the last occurrence.
    /// Absent when the key is missing or the node is not an object.
    pub fn get(&self, key: &str) -> Node<'a> {
        if self.kind() != ValueKind::Object {
            return Node::absent(self.doc);
        }
        match self.doc.index().find_member(self.idx, key, self.doc.bytes()) {
            Some(idx) => Node::new(self.doc, idx),
            None => Node::absent(self.doc),
        }
    }

    /// Array element by position. Absent when out of range or the node is
    /// not an array.
    pub fn at(&self, index: usize) -> Node<'a> {
        if self.kind() != ValueKind::Array {
            return Node::absent(self.doc);
        }
        match self.doc.index().child_at(self.idx, index) {
            Some(idx) => Node::new(self.doc, idx),
            None => Node::absent(self.doc),
        }
    }

    /// Resolve a dotted path relative to this node.
    ///
    /// Digits-only segments index arrays; every other segment is an object
    /// key lookup. An empty path resolves to the node itself.
    pub fn path(&self, path: &str) -> Node<'a> {
        crate::path::resolve(*self, path)
    }

    /// Decoded string content. Borrows from the document unless the literal
    /// contains escapes.
    pub fn as_str(&self) -> Result<Cow<'a, str>> {
        let entry = self.require(ValueKind::String)?;
        let raw = entry.span.as_str(self.doc.bytes()).unwrap_or("");
        let body = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
        if entry.has_escapes() {
            Ok(Cow::Owned(unescape(body)?))
        } else {
            Ok(Cow::Borrowed(body))
        }
    }

    /// Number decoded as a float.
    pub fn as_f64(&self) -> Result<f64> {
        let entry = self.require(ValueKind::Number)?;
        let raw = entry.span.as_str(self.doc.bytes()).unwrap_or("");
        raw.parse::<f64>().map_err(|_| {
            Error::parse("malformed number literal")
                .with_position(Position::locate(self.doc.bytes(), entry.span.offset as usize))
        })
    }

    /// Number decoded as an integer. Fractions truncate toward zero; values
    /// beyond the i64 range saturate.
    pub fn as_i64(&self) -> Result<i64> {
        Ok(self.as_f64()? as i64)
    }

    /// Boolean value.
    pub fn as_bool(&self) -> Result<bool> {
        let entry = self.require(ValueKind::Bool)?;
        Ok(entry.span.slice(self.doc.bytes()).first() == Some(&b't'))
    }

    /// String content, or `default` when the node is absent or not a string.
    pub fn str_or(&self, default: &'a str) -> Cow<'a, str> {
        self.as_str().unwrap_or(Cow::Borrowed(default))
    }

    /// Integer value, or `default` when the node is absent or not a number.
    /// Never coerces across types: a numeric string still yields `default`.
    pub fn int_or(&self, default: i64) -> i64 {
        self.as_i64().unwrap_or(default)
    }

    /// Float value, or `default` when the node is absent or not a number.
    pub fn float_or(&self, default: f64) -> f64 {
        self.as_f64().unwrap_or(default)
    }

    /// Boolean value, or `default` when the node is absent or not a bool.
    pub fn bool_or(&self, default: bool) -> bool {
        self.as_bool().unwrap_or(default)
    }

    /// Iterate the elements of an array. Empty for any other kind.
    pub fn elements(&self) -> Elements<'a> {
        let inner = if self.kind() == ValueKind::Array {
            self.doc.index().children(self.idx)
        } else {
            self.doc.index().children(NO_NODE)
        };
        Elements { doc: self.doc, inner }
    }

    /// Iterate the members of an object in document order. Duplicate keys
    /// each appear once. Empty for any other kind.
    pub fn members(&self) -> Members<'a> {
        let inner = if self.kind() == ValueKind::Object {
            self.doc.index().children(self.idx)
        } else {
            self.doc.index().children(NO_NODE)
        };
        Members { doc: self.doc, inner }
    }

    /// Depth-first traversal of this value and everything under it, as
    /// `(path, node)` pairs. The starting node comes first with path `""`.
    pub fn walk(&self) -> Walk<'a> {
        let mut stack = Vec::new();
        if self.exists() {
            stack.push((String::new(), self.idx));
        }
        Walk { doc: self.doc, stack }
    }

    /// Numeric reading used by queries and aggregation: a JSON number, or a
    /// string whose whole body parses as a finite float.
    pub(crate) fn numeric_value(&self) -> Option<f64> {
        let entry = self.entry()?;
        match entry.kind {
            ValueKind::Number => {
                let raw = entry.span.as_str(self.doc.bytes())?;
                raw.parse::<f64>().ok().filter(|v| v.is_finite())
            }
            ValueKind::String => {
                let body = self.as_str().ok()?;
                body.parse::<f64>().ok().filter(|v| v.is_finite())
            }
            _ => None,
        }
    }

    /// Scalar text form used for grouping and lexical comparison. Numbers
    /// keep their literal spelling; containers and absent nodes have none.
    pub(crate) fn string_form(&self) -> Option<Cow<'a, str>> {
        let entry = self.entry()?;
        match entry.kind {
            ValueKind::String => self.as_str().ok(),
            ValueKind::Number => entry.span.as_str(self.doc.bytes()).map(Cow::Borrowed),
            ValueKind::Bool => {
                let text = if entry.span.slice(self.doc.bytes()).first() == Some(&b't') {
                    "true"
                } else {
                    "false"
                };
                Some(Cow::Borrowed(text))
            }
            ValueKind::Null => Some(Cow::Borrowed("null")),
            _ => None,
        }
    }

    /// True when this number literal has no fraction or exponent.
    pub(crate) fn is_integer_literal(&self) -> bool {
        self.entry().is_some_and(|e| e.kind == ValueKind::Number && e.is_integer_number())
    }

    fn require(&self, expected: ValueKind) -> Result<&'a IndexEntry> {
        match self.entry() {
            Some(entry) if entry.kind == expected => Ok(entry),
            Some(entry) => Err(Error::type_mismatch(expected.name(), entry.kind.name())
                .with_position(Position::locate(
                    self.doc.bytes(),
                    entry.span.offset as usize,
                ))),
            None => Err(Error::not_found("value does not exist")),
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.doc.id() == other.doc.id() && self.idx == other.idx
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exists() {
            write!(f, "Node({} #{})", self.kind().name(), self.idx)
        } else {
            write!(f, "Node(absent)")
        }
    }
}

/// Iterator over array elements.
pub struct Elements<'a> {
    doc: &'a Document,
    inner: ChildIter<'a>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|idx| Node::new(self.doc, idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Elements<'_> {}

/// Iterator over object members as `(key, value)` pairs.
pub struct Members<'a> {
    doc: &'a Document,
    inner: ChildIter<'a>,
}

impl<'a> Iterator for Members<'a> {
    type Item = (Cow<'a, str>, Node<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.inner.next()?;
        let node = Node::new(self.doc, idx);
        let key = node.key().unwrap_or(Cow::Borrowed(""));
        Some((key, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Members<'_> {}

/// Depth-first `(path, node)` traversal.
pub struct Walk<'a> {
    doc: &'a Document,
    stack: Vec<(String, u32)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, Node<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, idx) = self.stack.pop()?;
        let node = Node::new(self.doc, idx);
        let kind = node.kind();
        if kind.is_container() {
            let is_object = kind == ValueKind::Object;
            let children: Vec<u32> = self.doc.index().children(idx).collect();
            for (i, &child) in children.iter().enumerate().rev() {
                let label = if is_object {
                    Node::new(self.doc, child)
                        .key()
                        .map(Cow::into_owned)
                        .unwrap_or_default()
                } else {
                    i.to_string()
                };
                let child_path = if path.is_empty() {
                    label
                } else {
                    format!("{path}.{label}")
                };
                self.stack.push((child_path, child));
            }
        }
        Some((path, node))
    }
}
