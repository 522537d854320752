//! Field masks for bit-packed motion-object table entries.
//!
//! Every board lays out its object table differently. Drivers describe each
//! attribute as a 4-word mask (the bits the attribute occupies in a 4-word
//! entry, with exactly one word non-zero) and the engine collapses that into
//! a [`FieldMask`] once at init.

use serde::{Deserialize, Serialize};

use super::MoError;

/// Number of 16-bit words in one object-table entry.
pub const ENTRY_WORDS: usize = 4;

/// One raw object-table entry as the hardware stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub words: [u16; ENTRY_WORDS],
}

impl ObjectEntry {
    pub const fn new(words: [u16; ENTRY_WORDS]) -> Self {
        Self { words }
    }
}

/// Source form of a field mask: the attribute's bits set in whichever of the
/// four entry words holds it. All zero means the attribute is unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskDescriptor(pub [u16; ENTRY_WORDS]);

impl MaskDescriptor {
    pub const UNUSED: MaskDescriptor = MaskDescriptor([0; ENTRY_WORDS]);

    /// Mask `bits` living in entry word `word`.
    pub const fn word(word: usize, bits: u16) -> Self {
        let mut words = [0; ENTRY_WORDS];
        words[word] = bits;
        Self(words)
    }
}

/// Decoded (word, shift, mask) triple for extracting one attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMask {
    word: usize,
    shift: u32,
    mask: u16,
}

impl FieldMask {
    /// Field that always reads as zero.
    pub const UNUSED: FieldMask = FieldMask { word: 0, shift: 0, mask: 0 };

    /// Build a mask directly. `word` is wrapped into the entry.
    pub const fn new(word: usize, shift: u32, mask: u16) -> Self {
        Self {
            word: word % ENTRY_WORDS,
            shift: shift & 15,
            mask,
        }
    }

    /// Collapse a 4-word descriptor. `field` names the attribute for the error.
    pub fn from_descriptor(field: &'static str, desc: &MaskDescriptor) -> Result<Self, MoError> {
        let mut active = desc.0.iter().enumerate().filter(|(_, bits)| **bits != 0);
        let Some((word, &bits)) = active.next() else {
            return Ok(Self::UNUSED);
        };
        if active.next().is_some() {
            return Err(MoError::MaskSpansWords {
                field,
                words: desc.0,
            });
        }

        let shift = bits.trailing_zeros();
        Ok(Self {
            word,
            shift,
            mask: bits >> shift,
        })
    }

    #[inline(always)]
    pub fn extract(&self, entry: &ObjectEntry) -> u16 {
        (entry.words[self.word] >> self.shift) & self.mask
    }

    /// Write `value` into the field's bits, leaving the rest of the word alone.
    /// Bits of `value` beyond the mask are discarded.
    pub fn insert(&self, entry: &mut ObjectEntry, value: u16) {
        let field = self.mask << self.shift;
        let word = &mut entry.words[self.word];
        *word = (*word & !field) | ((value << self.shift) & field);
    }

    pub fn word(&self) -> usize {
        self.word
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn mask(&self) -> u16 {
        self.mask
    }

    pub fn is_unused(&self) -> bool {
        self.mask == 0
    }

    /// Number of distinct values the field can take, as a power of two.
    pub fn value_count(&self) -> usize {
        round_to_power_of_two(self.mask as u32) as usize
    }
}

/// Smallest power of two strictly above the highest set bit of `value`;
/// 1 when `value` is zero. 0x3FF -> 0x400, 0x400 -> 0x800.
pub fn round_to_power_of_two(value: u32) -> u32 {
    if value == 0 {
        return 1;
    }
    1 << (32 - value.leading_zeros())
}

/// Exact base-2 logarithm; `None` unless `value` is a power of two.
pub fn log2_exact(value: u32) -> Option<u32> {
    value.is_power_of_two().then(|| value.trailing_zeros())
}
