//! Byte spans into the document buffer
//!
//! Every value and member key in the index is addressed as a span of the
//! original input. Slicing a span is how the crate reads text without ever
//! copying it.

/// Half-open byte range `[offset, offset + len)` into the input buffer.
///
/// Both fields are `u32`; `build_index` rejects inputs past 4 GiB, so a span
/// can always address the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Span covering `start..end` of the input.
    #[inline]
    pub const fn from_range(start: usize, end: usize) -> Self {
        Self {
            offset: start as u32,
            len: (end - start) as u32,
        }
    }

    /// The zero span, which slices to nothing.
    #[inline]
    pub const fn empty() -> Self {
        Self { offset: 0, len: 0 }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset.
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// The referenced bytes, or an empty slice when the span falls outside
    /// `input`. Out-of-range spans only arise from indices built over a
    /// different buffer, but reads must stay panic-free even then.
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.offset as usize;
        input
            .get(start..start.saturating_add(self.len as usize))
            .unwrap_or(&[])
    }

    /// The referenced bytes as UTF-8 text.
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}
