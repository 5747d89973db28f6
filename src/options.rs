//! Parse options
//!
//! Resource ceilings and strictness knobs enforced during the structural
//! scan. Exceeding a ceiling fails the parse; nothing is silently truncated.

/// Limits and strictness applied by [`Document::parse_with_options`].
///
/// [`Document::parse_with_options`]: crate::Document::parse_with_options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum container nesting depth. The root container is at depth 1;
    /// scalars do not add a level.
    pub max_depth: u32,
    /// Maximum raw byte length of a single string token (escapes undecoded).
    pub max_string_len: usize,
    /// Maximum number of members in a single object.
    pub max_object_keys: usize,
    /// Maximum number of elements in a single array.
    pub max_array_items: usize,
    /// Reject anything but whitespace after the first complete value.
    /// When false, the parser stops at the end of the first value and
    /// ignores the remainder of the buffer.
    pub strict: bool,
}

impl ParseOptions {
    /// Defaults suitable for untrusted input.
    pub const fn standard() -> Self {
        Self {
            max_depth: 128,
            max_string_len: 16 * 1024 * 1024,
            max_object_keys: 100_000,
            max_array_items: 1_000_000,
            strict: true,
        }
    }

    /// Effectively unlimited, for trusted input. Still rejects malformed
    /// syntax; only the resource ceilings and the trailing-bytes check are
    /// relaxed.
    pub const fn lenient() -> Self {
        Self {
            max_depth: 4096,
            max_string_len: usize::MAX,
            max_object_keys: usize::MAX,
            max_array_items: usize::MAX,
            strict: false,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        assert_eq!(ParseOptions::default(), ParseOptions::standard());
    }

    #[test]
    fn test_standard_values() {
        let opts = ParseOptions::standard();
        assert_eq!(opts.max_depth, 128);
        assert!(opts.strict);
    }

    #[test]
    fn test_lenient_relaxes_ceilings() {
        let opts = ParseOptions::lenient();
        assert!(opts.max_depth > ParseOptions::standard().max_depth);
        assert_eq!(opts.max_string_len, usize::MAX);
        assert!(!opts.strict);
    }
}
