//! Table-driven motion-object (hardware sprite) engine.
//!
//! Many arcade boards share one sprite processor design that differs only in
//! how the object-table bits are arranged. A driver describes its board with a
//! [`MotionObjectDesc`]; the engine then:
//!
//! - stores the object table exactly as the CPU writes it ([`ObjectTable`]),
//! - walks the hardware's linked list (or ring) per SLIP band to find the
//!   active objects, caching the walk until the table changes,
//! - draws each object into a 16-bit [`IndexedBitmap`] with the priority
//!   folded into the pixel's top bits,
//! - reports the touched area as a list of rectangles for compositing.
//!
//! ## Pixel format
//!
//! ```text
//!  15      12 11                          0
//! +----------+-----------------------------+
//! | priority | palette_base + color*gran + pen |
//! +----------+-----------------------------+
//! ```
//!
//! [`PRIORITY_SHIFT`] is a contract with whatever priority-aware compositor
//! consumes the bitmap; init rejects descriptors whose priority field or
//! palette range would not fit.
//!
//! ## Threading
//!
//! Bus writes and rendering both take `&mut self`: the CPU side and the video
//! side must run in strict order on one thread, or hand the engine across at
//! frame boundaries.
//!
//! [`IndexedBitmap`]: crate::graphics::IndexedBitmap

pub mod active;
pub mod desc;
pub mod dirty;
pub mod engine;
pub mod mask;
pub mod registry;
mod render;
pub mod table;

pub use active::{ActiveList, MAX_PER_BANK};
pub use desc::{MotionObjectDesc, ScreenConfig};
pub use dirty::DirtyGrid;
pub use engine::{MoFrame, MotionObjects, SpecialHandler, SpecialObject};
pub use mask::{FieldMask, MaskDescriptor, ObjectEntry};
pub use registry::{MotionObjectRegistry, MAX_MAPS};
pub use table::{ObjectTable, SlipTable};

use thiserror::Error;

/// Bit position of the priority tag inside a drawn pixel.
pub const PRIORITY_SHIFT: u32 = 12;
/// Pixel bits holding the priority tag.
pub const PRIORITY_MASK: u16 = 0xF000;
/// Pixel bits holding the palette index.
pub const COLOR_MASK: u16 = 0x0FFF;

#[derive(Debug, Error)]
pub enum MoError {
    #[error("Mask for {field} sets bits in more than one word: {words:04X?}")]
    MaskSpansWords {
        field: &'static str,
        words: [u16; mask::ENTRY_WORDS],
    },
    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo { what: &'static str, value: u32 },
    #[error("Object table needs at least one bank")]
    NoBanks,
    #[error("Link mask gives {entries} entries per bank, at most {max} are supported")]
    TooManyEntries { entries: usize, max: usize },
    #[error("Graphics set {index} not provided ({available} available)")]
    MissingGfx { index: usize, available: usize },
    #[error("Graphics set {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    GfxSizeMismatch {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    #[error("Priority mask {mask:#X} does not fit above bit {PRIORITY_SHIFT}")]
    PriorityOverflow { mask: u16 },
    #[error("Palette range {base:#X}+{count:#X} overlaps the priority bits")]
    PaletteOverflow { base: u16, count: u16 },
    #[error("SLIP height {slip_height} exceeds the {bitmap_height}-line wrap height")]
    SlipTooTall { slip_height: u32, bitmap_height: u32 },
    #[error("Screen size {width}x{height} is empty")]
    EmptyScreen { width: usize, height: usize },
    #[error("Motion object map {0} out of range")]
    InvalidMapId(usize),
    #[error("Motion object map {0} not initialized")]
    MapNotInitialized(usize),
    #[error("Saved {what} has {found} entries, expected {expected}")]
    StateMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
