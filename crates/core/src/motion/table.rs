//! Object table ("sprite RAM") and SLIP table storage.
//!
//! Boards wire the object table to the CPU in one of three shapes, all of
//! which land in the same entry array:
//!
//! | layout   | entry                   | word                    |
//! |----------|-------------------------|-------------------------|
//! | packed   | `offset / 4`            | `offset % 4`            |
//! | split    | `offset % entries`      | `(offset / entries) % 4`|
//! | expanded | `offset / 8`            | `(offset / 2) % 4`      |
//!
//! In the split layout `entries` is the bank size and the bank is
//! `offset / (4 * entries)`, so each bank holds its own four word regions.
//! Offsets are in 16-bit words and wrap around the table. In the expanded
//! layout each value occupies 32 bits; only the even (high) half reaches the
//! entry, the odd half is kept so reads see what was written.
//!
//! Writes take a lane mask: bits set in `mem_mask` come from `data`, the rest
//! keep their old value.

use serde::{Deserialize, Serialize};

use super::mask::{FieldMask, ObjectEntry, ENTRY_WORDS};
use super::MoError;
use crate::logging::{log, LogCategory, LogLevel};

#[inline]
fn combine(old: u16, data: u16, mem_mask: u16) -> u16 {
    (old & !mem_mask) | (data & mem_mask)
}

/// Serializable copy of an [`ObjectTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub entries: Vec<ObjectEntry>,
    pub expanded_low: Vec<u16>,
}

/// All banks of object-table entries, in bank order.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    entries: Vec<ObjectEntry>,
    entries_per_bank: usize,
    /// Odd halves of expanded-layout writes, one per entry word
    expanded_low: Vec<u16>,
}

impl ObjectTable {
    /// Zeroed table of `banks * entries_per_bank` entries.
    pub fn new(banks: usize, entries_per_bank: usize) -> Self {
        let size = banks * entries_per_bank;
        Self {
            entries: vec![ObjectEntry::default(); size],
            entries_per_bank,
            expanded_low: vec![0; size * ENTRY_WORDS],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the table in 16-bit words.
    pub fn word_count(&self) -> usize {
        self.entries.len() * ENTRY_WORDS
    }

    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Entry at `index`, wrapped into the table.
    #[inline]
    pub fn entry(&self, index: usize) -> &ObjectEntry {
        &self.entries[index % self.entries.len()]
    }

    pub fn set_entry(&mut self, index: usize, entry: ObjectEntry) {
        let size = self.entries.len();
        self.entries[index % size] = entry;
    }

    fn store(&mut self, entry: usize, word: usize, data: u16, mem_mask: u16) {
        let slot = &mut self.entries[entry].words[word];
        *slot = combine(*slot, data, mem_mask);
    }

    pub fn write_packed(&mut self, offset: usize, data: u16, mem_mask: u16) {
        let entry = (offset / ENTRY_WORDS) % self.entries.len();
        self.store(entry, offset % ENTRY_WORDS, data, mem_mask);
    }

    pub fn read_packed(&self, offset: usize) -> u16 {
        self.entry(offset / ENTRY_WORDS).words[offset % ENTRY_WORDS]
    }

    /// Entry index and word for a split-layout offset.
    fn split_slot(&self, offset: usize) -> (usize, usize) {
        let per_bank = self.entries_per_bank;
        let bank = offset / (per_bank * ENTRY_WORDS);
        let entry = (bank * per_bank + offset % per_bank) % self.entries.len();
        (entry, (offset / per_bank) % ENTRY_WORDS)
    }

    pub fn write_split(&mut self, offset: usize, data: u16, mem_mask: u16) {
        let (entry, word) = self.split_slot(offset);
        self.store(entry, word, data, mem_mask);
    }

    pub fn read_split(&self, offset: usize) -> u16 {
        let (entry, word) = self.split_slot(offset);
        self.entries[entry].words[word]
    }

    pub fn write_expanded(&mut self, offset: usize, data: u16, mem_mask: u16) {
        let word = offset / 2;
        if offset % 2 == 0 {
            let entry = (word / ENTRY_WORDS) % self.entries.len();
            self.store(entry, word % ENTRY_WORDS, data, mem_mask);
        } else {
            let len = self.expanded_low.len();
            let slot = &mut self.expanded_low[word % len];
            *slot = combine(*slot, data, mem_mask);
        }
    }

    pub fn read_expanded(&self, offset: usize) -> u16 {
        let word = offset / 2;
        if offset % 2 == 0 {
            self.entry(word / ENTRY_WORDS).words[word % ENTRY_WORDS]
        } else {
            self.expanded_low[word % self.expanded_low.len()]
        }
    }

    /// 32-bit write to a packed table; `offset` counts 32-bit units and the
    /// high half lands in the lower-numbered word.
    pub fn write_packed_32(&mut self, offset: usize, data: u32, mem_mask: u32) {
        let hi_mask = (mem_mask >> 16) as u16;
        let lo_mask = mem_mask as u16;
        if hi_mask != 0 {
            self.write_packed(offset * 2, (data >> 16) as u16, hi_mask);
        }
        if lo_mask != 0 {
            self.write_packed(offset * 2 + 1, data as u16, lo_mask);
        }
    }

    pub fn read_packed_32(&self, offset: usize) -> u32 {
        ((self.read_packed(offset * 2) as u32) << 16) | self.read_packed(offset * 2 + 1) as u32
    }

    pub fn state(&self) -> TableState {
        TableState {
            entries: self.entries.clone(),
            expanded_low: self.expanded_low.clone(),
        }
    }

    pub fn restore(&mut self, state: TableState) -> Result<(), MoError> {
        if state.entries.len() != self.entries.len() {
            return Err(MoError::StateMismatch {
                what: "object table",
                expected: self.entries.len(),
                found: state.entries.len(),
            });
        }
        if state.expanded_low.len() != self.expanded_low.len() {
            return Err(MoError::StateMismatch {
                what: "expanded table",
                expected: self.expanded_low.len(),
                found: state.expanded_low.len(),
            });
        }
        self.entries = state.entries;
        self.expanded_low = state.expanded_low;
        Ok(())
    }
}

/// Starting links for each SLIP band, one word per band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlipTable {
    words: Vec<u16>,
}

impl SlipTable {
    pub fn new(bands: usize) -> Self {
        Self {
            words: vec![0; bands],
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn write(&mut self, offset: usize, data: u16, mem_mask: u16) {
        if self.words.is_empty() {
            log(LogCategory::Bus, LogLevel::Debug, || {
                format!("SLIP write {:04X}@{} with SLIPs disabled", data, offset)
            });
            return;
        }
        let len = self.words.len();
        let slot = &mut self.words[offset % len];
        *slot = combine(*slot, data, mem_mask);
    }

    pub fn read(&self, offset: usize) -> u16 {
        if self.words.is_empty() {
            return 0;
        }
        self.words[offset % self.words.len()]
    }

    /// Two bands per write, high half first.
    pub fn write_32(&mut self, offset: usize, data: u32, mem_mask: u32) {
        let hi_mask = (mem_mask >> 16) as u16;
        let lo_mask = mem_mask as u16;
        if hi_mask != 0 {
            self.write(offset * 2, (data >> 16) as u16, hi_mask);
        }
        if lo_mask != 0 {
            self.write(offset * 2 + 1, data as u16, lo_mask);
        }
    }

    pub fn read_32(&self, offset: usize) -> u32 {
        ((self.read(offset * 2) as u32) << 16) | self.read(offset * 2 + 1) as u32
    }

    /// Starting link for `band`, decoded with the map's link field.
    #[inline]
    pub fn link(&self, band: usize, link_mask: &FieldMask) -> u16 {
        (self.read(band) >> link_mask.shift()) & link_mask.mask()
    }

    pub(crate) fn restore(&mut self, words: Vec<u16>) -> Result<(), MoError> {
        if words.len() != self.words.len() {
            return Err(MoError::StateMismatch {
                what: "SLIP table",
                expected: self.words.len(),
                found: words.len(),
            });
        }
        self.words = words;
        Ok(())
    }
}
