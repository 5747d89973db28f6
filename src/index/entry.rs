//! Structural Index Entry Types
//!
//! Compact structures recording one JSON value each: type tag, byte extent,
//! member key, and parent link. Only offsets into the original input are
//! stored - zero string allocation.

use super::span::Span;

/// Entry index meaning "no value here": absent nodes and the root's parent.
pub const NO_NODE: u32 = u32::MAX;

/// Flags for IndexEntry
pub mod entry_flags {
    /// String body contains escape sequences and needs decoding on access
    pub const HAS_ESCAPES: u8 = 0x01;
    /// Member key contains escape sequences
    pub const KEY_HAS_ESCAPES: u8 = 0x02;
    /// Number literal has no fraction or exponent
    pub const NUMBER_IS_INTEGER: u8 = 0x04;
}

/// JSON value type tag.
///
/// `Invalid` is never stored in the index; it is what absent nodes report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Invalid,
}

impl ValueKind {
    /// Lowercase name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Invalid => "invalid",
        }
    }

    /// True for objects and arrays.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

/// One value in the structural index
///
/// `span` covers the full token extent, quotes included for strings; `key`
/// is the member key body (quotes excluded) and is meaningful only when the
/// parent is an object. Fits in 24 bytes, one cache line per two entries.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    /// Value extent in the input
    pub span: Span,
    /// Member key body (empty when not an object member)
    pub key: Span,
    /// Parent entry index, [`NO_NODE`] for the root
    pub parent: u32,
    /// Value type tag
    pub kind: ValueKind,
    /// See [`entry_flags`]
    pub flags: u8,
}

impl IndexEntry {
    /// Create a new entry; the span length is patched when the value closes.
    #[inline]
    pub fn new(kind: ValueKind, start: u32, parent: u32) -> Self {
        Self {
            span: Span::new(start, 0),
            key: Span::empty(),
            parent,
            kind,
            flags: 0,
        }
    }

    /// Check if this is the root value
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent == NO_NODE
    }

    /// Check if this entry carries a non-empty member key span
    #[inline]
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Check if the string body needs escape decoding
    #[inline]
    pub fn has_escapes(&self) -> bool {
        self.flags & entry_flags::HAS_ESCAPES != 0
    }

    /// Check if the member key needs escape decoding
    #[inline]
    pub fn key_has_escapes(&self) -> bool {
        self.flags & entry_flags::KEY_HAS_ESCAPES != 0
    }

    /// Check if a number literal is integer-formed
    #[inline]
    pub fn is_integer_number(&self) -> bool {
        self.flags & entry_flags::NUMBER_IS_INTEGER != 0
    }
}

impl Default for IndexEntry {
    fn default() -> Self {
        Self {
            span: Span::empty(),
            key: Span::empty(),
            parent: NO_NODE,
            kind: ValueKind::Null,
            flags: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_entry_stays_compact() {
        assert!(
            std::mem::size_of::<IndexEntry>() <= 24,
            "entry grew past 24 bytes"
        );
    }

    #[test]
    fn test_entry_flags() {
        let mut entry = IndexEntry::new(ValueKind::String, 0, NO_NODE);
        assert!(!entry.has_escapes());

        entry.flags |= entry_flags::HAS_ESCAPES;
        assert!(entry.has_escapes());
        assert!(!entry.key_has_escapes());
    }

    #[test]
    fn test_entry_key() {
        let mut entry = IndexEntry::new(ValueKind::Number, 10, 0);
        assert!(!entry.has_key());
        assert!(!entry.is_root());

        entry.key = Span::new(4, 3);
        assert!(entry.has_key());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ValueKind::Object.name(), "object");
        assert_eq!(ValueKind::Invalid.name(), "invalid");
        assert!(ValueKind::Array.is_container());
        assert!(!ValueKind::String.is_container());
    }
}
