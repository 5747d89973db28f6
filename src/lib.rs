//! spanson - Zero-copy JSON document access
//!
//! Parse once into a compact structural index, then read values straight
//! out of the original buffer:
//!
//! - **Nodes**: copyable handles with panic-free navigation (`get`, `at`,
//!   dotted `path`) and strict or defaulted scalar getters
//! - **Queries**: filter, sort, and paginate over arrays and objects
//! - **Aggregation**: count/sum/avg/min/max with optional grouping
//! - **Path cache**: shared LRU + TTL cache of resolved paths
//! - **Validation**: declarative field rules
//!
//! ```
//! use spanson::{Cmp, Document, Order, Query};
//!
//! # fn main() -> spanson::Result<()> {
//! let doc = Document::parse(r#"{"items": [{"v": 10}, {"v": 5}, {"v": 15}]}"#)?;
//! assert_eq!(doc.path("items.0.v").as_i64()?, 10);
//!
//! let hits = Query::new()
//!     .filter("v", Cmp::Gt, 7)
//!     .sort_by("v", Order::Asc)
//!     .to_vec(doc.path("items"));
//! assert_eq!(hits.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod document;
pub mod error;
pub mod index;
pub mod node;
pub mod options;
pub mod parallel;
pub mod path;
pub mod query;
pub mod validate;

mod scan;

pub use aggregate::{AggValue, Aggregate};
pub use document::Document;
pub use error::{Error, ErrorKind, Position, Result};
pub use index::ValueKind;
pub use node::{Elements, Members, Node, Walk};
pub use options::ParseOptions;
pub use parallel::{map_elements, resolve_many};
pub use path::cache::{CacheConfig, CacheStats, PathCache};
pub use query::{Cmp, Operand, Order, Query};
pub use validate::{Rule, Validator};

/// Parse a document with standard limits. See [`Document::parse`].
pub fn parse(input: impl Into<Vec<u8>>) -> Result<Document> {
    Document::parse(input)
}

/// Parse a document with explicit limits.
pub fn parse_with_options(input: impl Into<Vec<u8>>, options: &ParseOptions) -> Result<Document> {
    Document::parse_with_options(input, options)
}
