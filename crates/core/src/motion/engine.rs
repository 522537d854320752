//! One motion-object map: configuration, bus interface, and persistent state.
//!
//! The render pass itself lives in `render.rs`; this file owns everything the
//! CPU side touches between frames.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::active::{ActiveList, Traversal, MAX_PER_BANK};
use super::desc::{MotionObjectDesc, ScreenConfig};
use super::dirty::DirtyGrid;
use super::mask::{log2_exact, round_to_power_of_two, FieldMask, ObjectEntry};
use super::table::{ObjectTable, SlipTable, TableState};
use super::{MoError, COLOR_MASK, PRIORITY_MASK, PRIORITY_SHIFT};
use crate::graphics::{GfxElement, IndexedBitmap, Rect};
use crate::logging::{log, LogCategory, LogLevel};

/// Driver hook for objects whose special field matches the special value.
///
/// Receives the MO bitmap, the band clip, and the decoded object; returns the
/// area it drew into (if any) so it can be composited.
pub type SpecialHandler =
    Box<dyn FnMut(&mut IndexedBitmap, &Rect, &SpecialObject) -> Option<Rect> + Send>;

/// Decoded object handed to a [`SpecialHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialObject {
    /// Tile code after lookup, code-high bits included
    pub code: u32,
    /// Effective pen base: palette offset plus priority tag
    pub color: u16,
    /// Screen position after scroll, chaining and wrap
    pub x: i32,
    pub y: i32,
    pub entry: ObjectEntry,
}

/// Result of one render pass.
#[derive(Debug, Clone, Copy)]
pub struct MoFrame<'a> {
    pub bitmap: &'a IndexedBitmap,
    /// Areas of `bitmap` that may hold object pixels
    pub rects: &'a [Rect],
    /// True if any object tile intersected the clip
    pub rendered: bool,
}

/// Every field extractor, decoded once at init.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Fields {
    pub link: FieldMask,
    pub gfx: FieldMask,
    pub code: FieldMask,
    pub code_high: FieldMask,
    pub color: FieldMask,
    pub xpos: FieldMask,
    pub ypos: FieldMask,
    pub width: FieldMask,
    pub height: FieldMask,
    pub hflip: FieldMask,
    pub vflip: FieldMask,
    pub priority: FieldMask,
    pub neighbor: FieldMask,
    pub absolute: FieldMask,
    pub special: FieldMask,
}

impl Fields {
    fn decode(desc: &MotionObjectDesc) -> Result<Self, MoError> {
        Ok(Self {
            link: FieldMask::from_descriptor("link", &desc.link_mask)?,
            gfx: FieldMask::from_descriptor("gfx", &desc.gfx_mask)?,
            code: FieldMask::from_descriptor("code", &desc.code_mask)?,
            code_high: FieldMask::from_descriptor("code_high", &desc.code_high_mask)?,
            color: FieldMask::from_descriptor("color", &desc.color_mask)?,
            xpos: FieldMask::from_descriptor("x", &desc.x_mask)?,
            ypos: FieldMask::from_descriptor("y", &desc.y_mask)?,
            width: FieldMask::from_descriptor("width", &desc.width_mask)?,
            height: FieldMask::from_descriptor("height", &desc.height_mask)?,
            hflip: FieldMask::from_descriptor("hflip", &desc.hflip_mask)?,
            vflip: FieldMask::from_descriptor("vflip", &desc.vflip_mask)?,
            priority: FieldMask::from_descriptor("priority", &desc.priority_mask)?,
            neighbor: FieldMask::from_descriptor("neighbor", &desc.neighbor_mask)?,
            absolute: FieldMask::from_descriptor("absolute", &desc.absolute_mask)?,
            special: FieldMask::from_descriptor("special", &desc.special_mask)?,
        })
    }
}

/// Neighbor chaining state, reset at the start of every band.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HoldState {
    pub last_x: i32,
    pub next_x: Option<i32>,
}

#[derive(Serialize, Deserialize)]
struct MoState {
    table: TableState,
    slips: Vec<u16>,
    bank: usize,
    xscroll: i32,
    yscroll: i32,
    palette_base: u16,
    code_lookup: Vec<u16>,
    color_lookup: Vec<u16>,
    gfx_lookup: Vec<u8>,
}

/// A configured motion-object map.
pub struct MotionObjects {
    pub(crate) fields: Fields,
    pub(crate) linked: bool,
    pub(crate) split: bool,
    pub(crate) reverse: bool,
    pub(crate) swap_xy: bool,
    pub(crate) next_neighbor: bool,
    pub(crate) slip_shift: Option<u32>,
    pub(crate) slip_offset: i32,
    pub(crate) max_per_line: usize,

    pub(crate) entries_per_bank: usize,
    pub(crate) banks: usize,
    pub(crate) tile_width: i32,
    pub(crate) tile_height: i32,
    pub(crate) bitmap_width: i32,
    pub(crate) bitmap_height: i32,
    pub(crate) screen: ScreenConfig,
    pub(crate) code_high_shift: u32,

    pub(crate) palette_base: u16,
    pub(crate) color_granularity: u16,
    /// Color codes available to the map; 0 means unlimited
    pub(crate) color_codes: u16,
    pub(crate) transparent_pen: u8,
    pub(crate) special_value: u16,
    pub(crate) special: Option<SpecialHandler>,

    pub(crate) bank: usize,
    pub(crate) xscroll: i32,
    pub(crate) yscroll: i32,

    pub(crate) table: ObjectTable,
    pub(crate) slips: SlipTable,
    pub(crate) code_lookup: Vec<u16>,
    pub(crate) color_lookup: Vec<u16>,
    pub(crate) gfx_lookup: Vec<u8>,
    pub(crate) gfx: Vec<Arc<GfxElement>>,

    pub(crate) active: ActiveList,
    pub(crate) hold: HoldState,
    pub(crate) dirty: DirtyGrid,
    pub(crate) rects: Vec<Rect>,
    pub(crate) bitmap: IndexedBitmap,
}

impl MotionObjects {
    /// Validate `desc` and build a map rendering into a `screen`-sized bitmap.
    ///
    /// `gfx` holds every graphics set the board has; the descriptor's
    /// `gfx_index` and gfx lookup select among them.
    pub fn new(
        desc: &MotionObjectDesc,
        screen: ScreenConfig,
        gfx: Vec<Arc<GfxElement>>,
        special: Option<SpecialHandler>,
    ) -> Result<Self, MoError> {
        let fields = Fields::decode(desc)?;

        if screen.width == 0 || screen.height == 0 {
            return Err(MoError::EmptyScreen {
                width: screen.width,
                height: screen.height,
            });
        }
        if desc.banks == 0 {
            return Err(MoError::NoBanks);
        }
        let base_gfx = gfx.get(desc.gfx_index).ok_or(MoError::MissingGfx {
            index: desc.gfx_index,
            available: gfx.len(),
        })?;

        // Tile advance and dirty marking assume one element size for every set
        if let Some((index, other)) = gfx
            .iter()
            .enumerate()
            .find(|(_, g)| g.width() != base_gfx.width() || g.height() != base_gfx.height())
        {
            return Err(MoError::GfxSizeMismatch {
                index,
                width: other.width(),
                height: other.height(),
                expected_width: base_gfx.width(),
                expected_height: base_gfx.height(),
            });
        }

        let tile_width = base_gfx.width() as u32;
        let tile_height = base_gfx.height() as u32;
        let tile_x_shift = log2_exact(tile_width).ok_or(MoError::NotPowerOfTwo {
            what: "tile width",
            value: tile_width,
        })?;
        let tile_y_shift = log2_exact(tile_height).ok_or(MoError::NotPowerOfTwo {
            what: "tile height",
            value: tile_height,
        })?;

        let entries_per_bank = fields.link.value_count();
        if entries_per_bank > MAX_PER_BANK {
            return Err(MoError::TooManyEntries {
                entries: entries_per_bank,
                max: MAX_PER_BANK,
            });
        }

        if (fields.priority.mask() as u32) << PRIORITY_SHIFT > PRIORITY_MASK as u32 {
            return Err(MoError::PriorityOverflow {
                mask: fields.priority.mask(),
            });
        }
        if desc.palette_base as u32 + desc.max_colors as u32 > COLOR_MASK as u32 + 1 {
            return Err(MoError::PaletteOverflow {
                base: desc.palette_base,
                count: desc.max_colors,
            });
        }

        let bitmap_width = round_to_power_of_two(fields.xpos.mask() as u32);
        let bitmap_height = round_to_power_of_two(fields.ypos.mask() as u32);

        let slip_shift = match desc.slip_height {
            0 => None,
            height => {
                let shift = log2_exact(height).ok_or(MoError::NotPowerOfTwo {
                    what: "SLIP height",
                    value: height,
                })?;
                if height > bitmap_height {
                    return Err(MoError::SlipTooTall {
                        slip_height: height,
                        bitmap_height,
                    });
                }
                Some(shift)
            }
        };
        let slip_bands = slip_shift.map_or(0, |shift| (bitmap_height >> shift) as usize);

        let color_granularity = base_gfx.color_granularity();
        let code_high_shift = fields.code.value_count().trailing_zeros();
        let max_per_line = match desc.max_per_line {
            0 => MAX_PER_BANK,
            n => n.min(MAX_PER_BANK),
        };

        log(LogCategory::Config, LogLevel::Info, || {
            format!(
                "{} entries x {} banks, {}x{} tiles, {}x{} wrap, {} SLIP bands, {}",
                entries_per_bank,
                desc.banks,
                tile_width,
                tile_height,
                bitmap_width,
                bitmap_height,
                slip_bands,
                if desc.linked { "linked" } else { "ring" }
            )
        });

        Ok(Self {
            linked: desc.linked,
            split: desc.split,
            reverse: desc.reverse,
            swap_xy: desc.swap_xy,
            next_neighbor: desc.next_neighbor,
            slip_shift,
            slip_offset: desc.slip_offset,
            max_per_line,

            entries_per_bank,
            banks: desc.banks,
            tile_width: tile_width as i32,
            tile_height: tile_height as i32,
            bitmap_width: bitmap_width as i32,
            bitmap_height: bitmap_height as i32,
            screen,
            code_high_shift,

            palette_base: desc.palette_base,
            color_granularity,
            color_codes: desc.max_colors / color_granularity,
            transparent_pen: desc.transparent_pen,
            special_value: desc.special_value,
            special,

            bank: 0,
            xscroll: 0,
            yscroll: 0,

            table: ObjectTable::new(desc.banks, entries_per_bank),
            slips: SlipTable::new(slip_bands),
            code_lookup: (0..fields.code.value_count()).map(|i| i as u16).collect(),
            color_lookup: (0..fields.color.value_count()).map(|i| i as u16).collect(),
            gfx_lookup: vec![desc.gfx_index as u8; fields.gfx.value_count()],
            gfx,

            active: ActiveList::new(entries_per_bank),
            hold: HoldState::default(),
            dirty: DirtyGrid::new(screen.width, screen.height, tile_x_shift, tile_y_shift),
            rects: Vec::new(),
            bitmap: IndexedBitmap::new(screen.width, screen.height, desc.transparent_pen as u16),
            fields,
        })
    }

    pub(crate) fn traversal(&self) -> Traversal {
        Traversal {
            linked: self.linked,
            link_mask: self.fields.link,
            max_objects: self.max_per_line,
        }
    }

    // Object table bus interface. Every write drops the cached active list.

    /// Write through whichever 16-bit layout the board uses.
    pub fn write(&mut self, offset: usize, data: u16, mem_mask: u16) {
        if self.split {
            self.write_split(offset, data, mem_mask);
        } else {
            self.write_packed(offset, data, mem_mask);
        }
    }

    pub fn read(&self, offset: usize) -> u16 {
        if self.split {
            self.table.read_split(offset)
        } else {
            self.table.read_packed(offset)
        }
    }

    pub fn write_packed(&mut self, offset: usize, data: u16, mem_mask: u16) {
        self.table.write_packed(offset, data, mem_mask);
        self.active.invalidate();
    }

    pub fn write_split(&mut self, offset: usize, data: u16, mem_mask: u16) {
        self.table.write_split(offset, data, mem_mask);
        self.active.invalidate();
    }

    pub fn write_expanded(&mut self, offset: usize, data: u16, mem_mask: u16) {
        self.table.write_expanded(offset, data, mem_mask);
        self.active.invalidate();
    }

    pub fn write_packed_32(&mut self, offset: usize, data: u32, mem_mask: u32) {
        self.table.write_packed_32(offset, data, mem_mask);
        self.active.invalidate();
    }

    pub fn read_packed(&self, offset: usize) -> u16 {
        self.table.read_packed(offset)
    }

    pub fn read_split(&self, offset: usize) -> u16 {
        self.table.read_split(offset)
    }

    pub fn read_expanded(&self, offset: usize) -> u16 {
        self.table.read_expanded(offset)
    }

    pub fn read_packed_32(&self, offset: usize) -> u32 {
        self.table.read_packed_32(offset)
    }

    /// Replace a whole entry, as a DMA copy would.
    pub fn set_entry(&mut self, index: usize, entry: ObjectEntry) {
        self.table.set_entry(index, entry);
        self.active.invalidate();
    }

    pub fn entry(&self, index: usize) -> &ObjectEntry {
        self.table.entry(index)
    }

    pub fn table(&self) -> &ObjectTable {
        &self.table
    }

    // SLIP RAM. SLIP words are read fresh every pass, so writes leave the
    // cached list alone.

    pub fn write_slip(&mut self, offset: usize, data: u16, mem_mask: u16) {
        self.slips.write(offset, data, mem_mask);
    }

    pub fn write_slip_32(&mut self, offset: usize, data: u32, mem_mask: u32) {
        self.slips.write_32(offset, data, mem_mask);
    }

    pub fn read_slip(&self, offset: usize) -> u16 {
        self.slips.read(offset)
    }

    pub fn read_slip_32(&self, offset: usize) -> u32 {
        self.slips.read_32(offset)
    }

    pub fn slips(&self) -> &SlipTable {
        &self.slips
    }

    // Video registers

    pub fn set_bank(&mut self, bank: usize) {
        let bank = if bank >= self.banks {
            log(LogCategory::Bus, LogLevel::Debug, || {
                format!("Bank {} out of range, wrapping into {}", bank, self.banks)
            });
            bank % self.banks
        } else {
            bank
        };
        if bank != self.bank {
            self.bank = bank;
            self.active.invalidate();
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn set_palette_base(&mut self, base: u16) {
        self.palette_base = base & COLOR_MASK;
    }

    pub fn palette_base(&self) -> u16 {
        self.palette_base
    }

    pub fn set_xscroll(&mut self, scroll: i32) {
        self.xscroll = scroll;
    }

    pub fn xscroll(&self) -> i32 {
        self.xscroll
    }

    pub fn set_yscroll(&mut self, scroll: i32) {
        self.yscroll = scroll;
    }

    pub fn yscroll(&self) -> i32 {
        self.yscroll
    }

    // Lookup tables, indexed by the raw field value

    pub fn code_lookup(&self) -> &[u16] {
        &self.code_lookup
    }

    pub fn code_lookup_mut(&mut self) -> &mut [u16] {
        &mut self.code_lookup
    }

    pub fn color_lookup(&self) -> &[u16] {
        &self.color_lookup
    }

    pub fn color_lookup_mut(&mut self) -> &mut [u16] {
        &mut self.color_lookup
    }

    pub fn gfx_lookup(&self) -> &[u8] {
        &self.gfx_lookup
    }

    pub fn gfx_lookup_mut(&mut self) -> &mut [u8] {
        &mut self.gfx_lookup
    }

    // Geometry and instrumentation

    pub fn entries_per_bank(&self) -> usize {
        self.entries_per_bank
    }

    pub fn bank_count(&self) -> usize {
        self.banks
    }

    /// Tile size in pixels
    pub fn tile_size(&self) -> (i32, i32) {
        (self.tile_width, self.tile_height)
    }

    /// Size positions wrap at, derived from the X/Y masks
    pub fn wrap_size(&self) -> (i32, i32) {
        (self.bitmap_width, self.bitmap_height)
    }

    pub fn slip_band_count(&self) -> usize {
        self.slips.len()
    }

    pub fn screen(&self) -> &ScreenConfig {
        &self.screen
    }

    pub fn transparent_pen(&self) -> u16 {
        self.transparent_pen as u16
    }

    pub fn bitmap(&self) -> &IndexedBitmap {
        &self.bitmap
    }

    /// Rectangles produced by the last render
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Table indices of the most recently built active list
    pub fn active_entries(&self) -> &[usize] {
        self.active.entries()
    }

    /// How many times the active list has been rebuilt
    pub fn active_list_builds(&self) -> u64 {
        self.active.builds()
    }

    pub fn save_state(&self) -> Result<Value, MoError> {
        let state = MoState {
            table: self.table.state(),
            slips: self.slips.words().to_vec(),
            bank: self.bank,
            xscroll: self.xscroll,
            yscroll: self.yscroll,
            palette_base: self.palette_base,
            code_lookup: self.code_lookup.clone(),
            color_lookup: self.color_lookup.clone(),
            gfx_lookup: self.gfx_lookup.clone(),
        };
        Ok(serde_json::to_value(state)?)
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state) on a map
    /// with the same configuration. On error the map is left untouched.
    pub fn load_state(&mut self, value: &Value) -> Result<(), MoError> {
        let state = MoState::deserialize(value)?;

        for (what, expected, found) in [
            ("code lookup", self.code_lookup.len(), state.code_lookup.len()),
            ("color lookup", self.color_lookup.len(), state.color_lookup.len()),
            ("gfx lookup", self.gfx_lookup.len(), state.gfx_lookup.len()),
            ("SLIP table", self.slips.len(), state.slips.len()),
            ("object table", self.table.len(), state.table.entries.len()),
        ] {
            if expected != found {
                return Err(MoError::StateMismatch { what, expected, found });
            }
        }

        self.table.restore(state.table)?;
        self.slips.restore(state.slips)?;
        self.bank = state.bank % self.banks;
        self.xscroll = state.xscroll;
        self.yscroll = state.yscroll;
        self.palette_base = state.palette_base & COLOR_MASK;
        self.code_lookup = state.code_lookup;
        self.color_lookup = state.color_lookup;
        self.gfx_lookup = state.gfx_lookup;
        self.active.invalidate();
        Ok(())
    }
}
