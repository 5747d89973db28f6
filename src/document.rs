//! Owned JSON document
//!
//! A `Document` owns the raw input bytes and the structural index built over
//! them in a single parse. Everything afterwards reads spans out of that
//! buffer. A parsed document never changes, so shared references are safe to
//! use from any number of threads without synchronization; only the optional
//! path cache carries interior mutability, and it locks internally.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::index::builder::build_index;
use crate::index::{StructuralIndex, NO_NODE};
use crate::node::Node;
use crate::options::ParseOptions;

/// Process-wide document id counter. Ids distinguish documents in the path
/// cache, so they must never repeat within a process.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// An immutable, indexed JSON document.
#[derive(Debug)]
pub struct Document {
    bytes: Vec<u8>,
    index: StructuralIndex,
    id: u64,
}

impl Document {
    /// Parse a document with [`ParseOptions::standard`].
    pub fn parse(input: impl Into<Vec<u8>>) -> Result<Self> {
        Self::parse_with_options(input, &ParseOptions::standard())
    }

    /// Parse a document, taking ownership of the input bytes.
    pub fn parse_with_options(input: impl Into<Vec<u8>>, options: &ParseOptions) -> Result<Self> {
        let bytes = input.into();
        let index = build_index(&bytes, options)?;
        let id = NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            id,
            bytes = bytes.len(),
            entries = index.entry_count(),
            "parsed document"
        );
        Ok(Self { bytes, index, id })
    }

    /// Root value of the document. Absent for a default-constructed document.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, self.index.root().unwrap_or(NO_NODE))
    }

    /// Resolve a dotted path from the root. See [`Node::path`].
    pub fn path(&self, path: &str) -> Node<'_> {
        self.root().path(path)
    }

    /// Process-unique id, used to key cached path resolutions.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The raw input the document was parsed from.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub(crate) fn index(&self) -> &StructuralIndex {
        &self.index
    }
}

impl Default for Document {
    /// An empty document with an absent root.
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            index: StructuralIndex::new(),
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}
