//! Image File Directory scanning.
//!
//! An IFD is a 2-byte entry count, `count` 12-byte records sorted by tag ID,
//! and a 4-byte offset to the next IFD. Directories in raw files can hold
//! thousands of records (maker notes, strip tables), so the common path is a
//! bounded scan that stops as soon as no wanted tag can follow.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{
    ByteOrder, IfdEntry, InlinePolicy, IFD_COUNT_SIZE, IFD_ENTRY_SIZE, IFD_NEXT_OFFSET_SIZE,
};
use super::wanted::WantedSet;

/// Reads directories from a source using a fixed byte order and inline policy.
pub struct IfdScanner<'a, R: RangeReader> {
    reader: &'a mut R,
    byte_order: ByteOrder,
    policy: InlinePolicy,
}

impl<'a, R: RangeReader> IfdScanner<'a, R> {
    /// Create a new scanner.
    pub fn new(reader: &'a mut R, byte_order: ByteOrder, policy: InlinePolicy) -> Self {
        Self {
            reader,
            byte_order,
            policy,
        }
    }

    /// Read the entry count of the IFD at `offset`.
    pub fn entry_count(&mut self, offset: u64) -> Result<u16, TiffError> {
        let bytes = self.reader.read_exact_at(offset, IFD_COUNT_SIZE)?;
        Ok(self.byte_order.read_u16(&bytes))
    }

    /// Read and decode record `index` of the IFD at `offset`.
    fn read_entry(&mut self, offset: u64, index: u16) -> Result<IfdEntry, TiffError> {
        let position = entry_position(offset, index);
        let bytes = self.reader.read_exact_at(position, IFD_ENTRY_SIZE)?;
        Ok(IfdEntry::parse(&bytes, self.byte_order, self.policy))
    }

    /// Collect the wanted entries of the IFD at `offset`.
    ///
    /// Records are visited in order and the scan stops at the first record
    /// whose tag is greater than or equal to `wanted.max()`, whether or not
    /// that record was itself wanted. An empty set therefore stops after the
    /// first record.
    pub fn collect(
        &mut self,
        offset: u64,
        wanted: &WantedSet,
    ) -> Result<HashMap<u16, IfdEntry>, TiffError> {
        let count = self.entry_count(offset)?;
        debug!(
            source = self.reader.identifier(),
            offset,
            count,
            wanted = wanted.len(),
            "scanning IFD"
        );

        let mut entries = HashMap::with_capacity(wanted.len());
        for index in 0..count {
            let entry = self.read_entry(offset, index)?;
            let tag = entry.tag_id;

            if wanted.contains(tag) {
                trace!(tag, count = entry.count, "collected entry");
                entries.insert(tag, entry);
            }

            if tag >= wanted.max() {
                trace!(tag, scanned = index + 1, "early exit");
                break;
            }
        }

        Ok(entries)
    }

    /// Read every record of the IFD at `offset`, in file order.
    pub fn entries(&mut self, offset: u64) -> Result<Vec<IfdEntry>, TiffError> {
        let count = self.entry_count(offset)?;
        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            entries.push(self.read_entry(offset, index)?);
        }
        Ok(entries)
    }

    /// Read the next-IFD pointer that follows the records of the IFD at
    /// `offset`. Returns 0 when this is the last directory.
    pub fn next_ifd_offset(&mut self, offset: u64) -> Result<u64, TiffError> {
        let count = self.entry_count(offset)?;
        let position = entry_position(offset, count);
        let bytes = self.reader.read_exact_at(position, IFD_NEXT_OFFSET_SIZE)?;
        Ok(self.byte_order.read_u32(&bytes) as u64)
    }

    /// Offset of directory `index` in the chain starting at `first`.
    ///
    /// Index 0 is `first` itself. Each step follows a next-IFD pointer; a
    /// pointer back to an already visited directory fails with
    /// `CyclicDirectory`, a zero pointer with `DirectoryNotFound`.
    pub fn chain_offset(&mut self, first: u64, index: usize) -> Result<u64, TiffError> {
        let mut visited = HashSet::new();
        let mut offset = first;
        visited.insert(offset);

        for step in 0..index {
            let next = self.next_ifd_offset(offset)?;
            if next == 0 {
                return Err(TiffError::DirectoryNotFound(step + 1));
            }
            if !visited.insert(next) {
                return Err(TiffError::CyclicDirectory(next));
            }
            offset = next;
        }

        Ok(offset)
    }
}

/// Absolute position of record `index` in the IFD at `offset`.
#[inline]
fn entry_position(offset: u64, index: u16) -> u64 {
    offset + IFD_COUNT_SIZE as u64 + index as u64 * IFD_ENTRY_SIZE as u64
}

// =============================================================================
// Tests
// =============================================================================
