//! Structural index
//!
//! Memory-efficient representation of a JSON document using only byte
//! offsets into the original input:
//!
//! - **Zero-copy values**: every value is an (offset, length) span into the
//!   input; unescaped strings are the only place bytes are ever copied.
//! - **Flat storage**: one 24-byte entry per value in document order, plus a
//!   flat child table shared by all containers.
//! - **Cache-friendly**: lookups walk contiguous arrays, never pointers.
//!
//! ```text
//! StructuralIndex
//! ├── entries: Vec<IndexEntry>       # 24 bytes each, document order
//! ├── children_ranges: Vec<(u32,u32)> # per-entry slice of children_data
//! └── children_data: Vec<u32>        # child entry indices
//! ```

pub mod builder;
pub mod entry;
pub mod span;
pub mod structural;

pub use entry::{IndexEntry, ValueKind, NO_NODE};
pub use span::Span;
pub use structural::StructuralIndex;
