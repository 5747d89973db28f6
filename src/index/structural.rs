//! The table every read goes through
//!
//! Holds one [`IndexEntry`] per value in document order plus a flat child
//! table, so navigating a document is array indexing rather than pointer
//! chasing. Costs 24 bytes per value and 4 per child link.

use crate::scan::unescape;

use super::entry::{IndexEntry, ValueKind, NO_NODE};

/// The structural index of a JSON document.
///
/// Each entry's children occupy one contiguous run of `children_data`,
/// described by the `(start, count)` pair at the same position in
/// `children_ranges`.
#[derive(Debug, Default)]
pub struct StructuralIndex {
    /// Value entries (index 0 is always the root value)
    entries: Vec<IndexEntry>,
    /// Per-entry (start, count) range into children_data
    children_ranges: Vec<(u32, u32)>,
    /// Flat storage of all child entry indices
    children_data: Vec<u32>,
    /// Root entry index (None if the document is absent)
    root: Option<u32>,
}

impl StructuralIndex {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create with an estimated entry count. The child tables start empty;
    /// build_children_from_parents sizes them exactly.
    pub fn with_capacity(entries: usize) -> Self {
        Self {
            entries: Vec::with_capacity(entries),
            children_ranges: Vec::new(),
            children_data: Vec::new(),
            root: None,
        }
    }

    /// Get the root entry index
    #[inline]
    pub fn root(&self) -> Option<u32> {
        self.root
    }

    /// Get an entry by index
    #[inline]
    pub fn get(&self, idx: u32) -> Option<&IndexEntry> {
        self.entries.get(idx as usize)
    }

    /// Get the kind of an entry, Invalid when out of range
    #[inline]
    pub fn kind(&self, idx: u32) -> ValueKind {
        self.get(idx).map_or(ValueKind::Invalid, |e| e.kind)
    }

    /// Get total number of entries
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over the children of an entry in document order
    pub fn children(&self, idx: u32) -> ChildIter<'_> {
        let items = self
            .children_ranges
            .get(idx as usize)
            .and_then(|&(start, count)| {
                let start = start as usize;
                self.children_data.get(start..start + count as usize)
            })
            .unwrap_or(&[]);
        ChildIter { items: items.iter() }
    }

    /// Get number of children of an entry
    #[inline]
    pub fn child_count(&self, idx: u32) -> usize {
        self.children_ranges
            .get(idx as usize)
            .map(|(_, count)| *count as usize)
            .unwrap_or(0)
    }

    /// Get the i-th child of an entry, O(1)
    #[inline]
    pub fn child_at(&self, idx: u32, i: usize) -> Option<u32> {
        let (start, count) = self.children_ranges.get(idx as usize).copied()?;
        if i >= count as usize {
            return None;
        }
        self.children_data.get(start as usize + i).copied()
    }

    /// Find the object member with the given key.
    ///
    /// Scans children in reverse so the last occurrence of a duplicate key
    /// wins; the index itself retains every occurrence for full traversal.
    pub fn find_member(&self, object_idx: u32, key: &str, input: &[u8]) -> Option<u32> {
        let (start, count) = self.children_ranges.get(object_idx as usize).copied()?;
        let end = start as usize + count as usize;
        for data_idx in (start as usize..end).rev() {
            let child_idx = *self.children_data.get(data_idx)?;
            let child = self.get(child_idx)?;
            if child.key_has_escapes() {
                let raw = child.key.as_str(input)?;
                if unescape(raw).ok().as_deref() == Some(key) {
                    return Some(child_idx);
                }
            } else if child.key.slice(input) == key.as_bytes() {
                return Some(child_idx);
            }
        }
        None
    }

    // Mutation below is only reachable from the index builder; a finished
    // index is read-only.

    /// Append an entry, returning its index.
    pub(crate) fn add_entry(&mut self, entry: IndexEntry) -> u32 {
        let idx = self.entries.len() as u32;
        self.entries.push(entry);
        idx
    }

    /// Get a mutable entry by index (span patching at container close)
    #[inline]
    pub(crate) fn get_mut(&mut self, idx: u32) -> Option<&mut IndexEntry> {
        self.entries.get_mut(idx as usize)
    }

    /// Record the root entry
    pub(crate) fn set_root(&mut self, idx: u32) {
        self.root = Some(idx);
    }

    /// Build the child tables from parent links, counting-sort style: tally
    /// children per parent, turn the tallies into range offsets, then drop
    /// each entry into the next free slot of its parent's range. Entries
    /// were appended by one forward scan, so visiting them in entry order
    /// leaves every range in document order.
    pub(crate) fn build_children_from_parents(&mut self) {
        let num_entries = self.entries.len();
        if num_entries == 0 {
            return;
        }

        let mut counts = vec![0u32; num_entries];
        for entry in &self.entries {
            if entry.parent != NO_NODE && (entry.parent as usize) < num_entries {
                counts[entry.parent as usize] += 1;
            }
        }

        let mut offset = 0u32;
        self.children_ranges = counts
            .iter()
            .map(|&count| {
                let range = (offset, count);
                offset += count;
                range
            })
            .collect();

        // `offset` now totals all children
        self.children_data = vec![0u32; offset as usize];
        let mut placed = vec![0u32; num_entries];
        for (entry_idx, entry) in self.entries.iter().enumerate() {
            if entry.parent != NO_NODE && (entry.parent as usize) < num_entries {
                let parent = entry.parent as usize;
                let slot = self.children_ranges[parent].0 + placed[parent];
                self.children_data[slot as usize] = entry_idx as u32;
                placed[parent] += 1;
            }
        }
    }

    /// Release the spare capacity left over from the builder's estimates.
    pub(crate) fn shrink_to_fit(&mut self) {
        self.entries.shrink_to_fit();
        self.children_ranges.shrink_to_fit();
        self.children_data.shrink_to_fit();
    }
}

/// Iterator over child entry indices, one container's run of the flat table.
pub struct ChildIter<'a> {
    items: std::slice::Iter<'a, u32>,
}

impl Iterator for ChildIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for ChildIter<'_> {}
