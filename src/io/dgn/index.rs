//! Random-access element index.
//!
//! One pass over the file records, for every element, its level, type,
//! payload kind, flags and byte offset, and accumulates the range of all
//! live, non-complex elements. Sessions build the index lazily the first
//! time it is needed.

use super::filter::raw_extents;
use super::raw_reader::RawHeader;
use crate::elements::StructureType;
use crate::types::{IndexFlags, UorExtents};

/// Index entry for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub level: u8,
    pub element_type: u8,
    pub structure_type: StructureType,
    pub flags: IndexFlags,
    /// Byte offset of the record in the file
    pub offset: u64,
}

impl IndexEntry {
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(IndexFlags::DELETED)
    }

    pub fn is_complex(&self) -> bool {
        self.flags.contains(IndexFlags::COMPLEX)
    }
}

/// Index of a whole file, in element id order.
#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    entries: Vec<IndexEntry>,
    extents: Option<UorExtents>,
}

impl ElementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the entry for a record read at `offset`.
    pub fn push(&mut self, offset: u64, header: RawHeader, record: &[u8]) -> &IndexEntry {
        let mut flags = IndexFlags::empty();
        if record.first().is_some_and(|b| b & 0x80 != 0) {
            flags |= IndexFlags::COMPLEX;
        }
        if record.get(1).is_some_and(|b| b & 0x80 != 0) {
            flags |= IndexFlags::DELETED;
        }

        if flags.is_empty() {
            if let Some(ext) = raw_extents(header.element_type, record) {
                self.extents = Some(match self.extents {
                    Some(acc) => acc.merge(&ext),
                    None => ext,
                });
            }
        }

        self.entries.push(IndexEntry {
            level: header.level,
            element_type: header.element_type,
            structure_type: StructureType::classify(header.element_type, header.level),
            flags,
            offset,
        });
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn get(&self, element_id: usize) -> Option<&IndexEntry> {
        self.entries.get(element_id)
    }

    pub fn last(&self) -> Option<&IndexEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Biased range of every live top level element, if any had one.
    pub fn extents(&self) -> Option<UorExtents> {
        self.extents
    }

    /// Mark an element deleted after it was tombstoned in the file.
    pub(crate) fn mark_deleted(&mut self, element_id: usize) {
        if let Some(entry) = self.entries.get_mut(element_id) {
            entry.flags |= IndexFlags::DELETED;
        }
    }
}
