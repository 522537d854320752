//! Driver-facing description of a motion-object board.
//!
//! A descriptor is plain data: drivers build one in Rust or load it from JSON.
//! Field masks are given as four-word arrays, one word per entry word:
//!
//! ```
//! use arcade_core::motion::MotionObjectDesc;
//!
//! let desc = MotionObjectDesc::from_json(r#"{
//!     "banks": 1,
//!     "linked": true,
//!     "link_mask":  [0, 0, 0, 1023],
//!     "code_mask":  [0, 2047, 0, 0],
//!     "x_mask":     [0, 0, 65408, 0],
//!     "y_mask":     [65408, 0, 0, 0]
//! }"#).unwrap();
//! assert_eq!(desc.link_mask.0[3], 0x3FF);
//! assert_eq!(desc.max_per_line, 0);
//! ```

use serde::{Deserialize, Serialize};

use super::mask::MaskDescriptor;
use super::MoError;
use crate::graphics::Rect;

/// Static configuration of one motion-object map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionObjectDesc {
    /// Index into the graphics sets handed to init
    pub gfx_index: usize,
    /// Number of object-table banks
    pub banks: usize,
    /// Follow each entry's link field instead of walking a ring
    pub linked: bool,
    /// Table words live in four separate regions
    pub split: bool,
    /// Draw the active list back to front
    pub reverse: bool,
    /// Tiles advance down columns instead of across rows
    pub swap_xy: bool,
    /// Neighbor bit positions the next object rather than this one
    pub next_neighbor: bool,
    /// Pixel height of one SLIP band; 0 disables SLIPs
    pub slip_height: u32,
    /// Pixel offset applied to SLIP band positions
    pub slip_offset: i32,
    /// Cap on objects walked per band; 0 means the full bank
    pub max_per_line: usize,
    pub palette_base: u16,
    /// Palette entries the map may use; 0 means unlimited
    pub max_colors: u16,
    pub transparent_pen: u8,

    pub link_mask: MaskDescriptor,
    pub gfx_mask: MaskDescriptor,
    pub code_mask: MaskDescriptor,
    pub code_high_mask: MaskDescriptor,
    pub color_mask: MaskDescriptor,
    pub x_mask: MaskDescriptor,
    pub y_mask: MaskDescriptor,
    pub width_mask: MaskDescriptor,
    pub height_mask: MaskDescriptor,
    pub hflip_mask: MaskDescriptor,
    pub vflip_mask: MaskDescriptor,
    pub priority_mask: MaskDescriptor,
    pub neighbor_mask: MaskDescriptor,
    pub absolute_mask: MaskDescriptor,
    pub special_mask: MaskDescriptor,
    /// Value of the special field that hands the object to the callback
    pub special_value: u16,
}

impl Default for MotionObjectDesc {
    fn default() -> Self {
        Self {
            gfx_index: 0,
            banks: 1,
            linked: false,
            split: false,
            reverse: false,
            swap_xy: false,
            next_neighbor: false,
            slip_height: 0,
            slip_offset: 0,
            max_per_line: 0,
            palette_base: 0,
            max_colors: 0,
            transparent_pen: 0,
            link_mask: MaskDescriptor::UNUSED,
            gfx_mask: MaskDescriptor::UNUSED,
            code_mask: MaskDescriptor::UNUSED,
            code_high_mask: MaskDescriptor::UNUSED,
            color_mask: MaskDescriptor::UNUSED,
            x_mask: MaskDescriptor::UNUSED,
            y_mask: MaskDescriptor::UNUSED,
            width_mask: MaskDescriptor::UNUSED,
            height_mask: MaskDescriptor::UNUSED,
            hflip_mask: MaskDescriptor::UNUSED,
            vflip_mask: MaskDescriptor::UNUSED,
            priority_mask: MaskDescriptor::UNUSED,
            neighbor_mask: MaskDescriptor::UNUSED,
            absolute_mask: MaskDescriptor::UNUSED,
            special_mask: MaskDescriptor::UNUSED,
            special_value: 0,
        }
    }
}

impl MotionObjectDesc {
    pub fn from_json(json: &str) -> Result<Self, MoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Screen geometry the map renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
    /// Area the CRT actually shows; SLIP bands below it wrap to the top
    pub visible_area: Rect,
}

impl ScreenConfig {
    /// Screen whose visible area is the whole bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            visible_area: Rect::from_size(0, 0, width as i32, height as i32),
        }
    }

    pub fn with_visible_area(mut self, visible_area: Rect) -> Self {
        self.visible_area = visible_area;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width as i32, self.height as i32)
    }
}
