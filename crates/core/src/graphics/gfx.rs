//! Decoded graphics elements (tile sets) and the transparent tile blitter.
//!
//! Arcade boards keep sprite artwork in planar graphics ROMs. A [`GfxLayout`]
//! describes where each bit plane, column and row of an element lives in the
//! ROM, measured in bits, and [`GfxElement::decode`] unpacks the whole ROM
//! into one byte per pixel so drawing never touches bit planes again.
//!
//! # Layout example
//!
//! Two 16x16 elements at 4bpp, pixels stored chunky:
//!
//! ```
//! use arcade_core::graphics::{GfxElement, GfxLayout};
//!
//! let layout = GfxLayout::packed(16, 16, 4, 2);
//! let rom = vec![0u8; 16 * 16 * 4 * 2 / 8];
//! let gfx = GfxElement::decode(&layout, &rom).unwrap();
//! assert_eq!(gfx.total_elements(), 2);
//! assert_eq!(gfx.color_granularity(), 16);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bitmap::IndexedBitmap;
use super::rect::Rect;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GfxError {
    #[error("Element size {width}x{height} is empty")]
    EmptyElement { width: usize, height: usize },
    #[error("Layout declares {planes} bit planes, at most 8 are supported")]
    TooManyPlanes { planes: usize },
    #[error("Layout {axis} offsets list {found} entries, expected {expected}")]
    OffsetCount {
        axis: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Graphics ROM is {rom_bits} bits, layout reads bit {needed}")]
    RomTooSmall { rom_bits: usize, needed: usize },
    #[error("Pen data of {len} bytes is not a whole number of {element_size}-pixel elements")]
    PenDataSize { len: usize, element_size: usize },
}

/// Bit-level description of a graphics ROM, one entry per element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfxLayout {
    pub width: usize,
    pub height: usize,
    pub total: usize,
    /// Bit offset of each plane, most significant plane first
    pub plane_offsets: Vec<u32>,
    pub x_offsets: Vec<u32>,
    pub y_offsets: Vec<u32>,
    /// Distance between consecutive elements, in bits
    pub element_stride: u32,
}

impl GfxLayout {
    /// Chunky layout: each pixel's `bits_per_pixel` bits are adjacent, MSB
    /// first, rows stored top to bottom.
    pub fn packed(width: usize, height: usize, bits_per_pixel: usize, total: usize) -> Self {
        let bpp = bits_per_pixel as u32;
        Self {
            width,
            height,
            total,
            plane_offsets: (0..bpp).collect(),
            x_offsets: (0..width as u32).map(|x| x * bpp).collect(),
            y_offsets: (0..height as u32).map(|y| y * width as u32 * bpp).collect(),
            element_stride: (width * height) as u32 * bpp,
        }
    }

    fn validate(&self) -> Result<(), GfxError> {
        if self.width == 0 || self.height == 0 {
            return Err(GfxError::EmptyElement {
                width: self.width,
                height: self.height,
            });
        }
        if self.plane_offsets.len() > 8 {
            return Err(GfxError::TooManyPlanes {
                planes: self.plane_offsets.len(),
            });
        }
        for (axis, offsets, expected) in [
            ("x", &self.x_offsets, self.width),
            ("y", &self.y_offsets, self.height),
        ] {
            if offsets.len() != expected {
                return Err(GfxError::OffsetCount {
                    axis,
                    expected,
                    found: offsets.len(),
                });
            }
        }
        Ok(())
    }
}

/// A set of equally sized elements with one pen per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxElement {
    width: usize,
    height: usize,
    total_elements: usize,
    color_granularity: u16,
    pens: Vec<u8>,
}

impl GfxElement {
    /// Wrap already decoded pens. `pens` holds `width * height` bytes per element.
    pub fn from_pens(
        width: usize,
        height: usize,
        color_granularity: u16,
        pens: Vec<u8>,
    ) -> Result<Self, GfxError> {
        let element_size = width * height;
        if element_size == 0 {
            return Err(GfxError::EmptyElement { width, height });
        }
        if pens.is_empty() || pens.len() % element_size != 0 {
            return Err(GfxError::PenDataSize {
                len: pens.len(),
                element_size,
            });
        }
        Ok(Self {
            width,
            height,
            total_elements: pens.len() / element_size,
            color_granularity: color_granularity.max(1),
            pens,
        })
    }

    /// Unpack `rom` according to `layout`.
    pub fn decode(layout: &GfxLayout, rom: &[u8]) -> Result<Self, GfxError> {
        layout.validate()?;

        let planes = layout.plane_offsets.len();
        let rom_bits = rom.len() * 8;
        let mut pens = Vec::with_capacity(layout.width * layout.height * layout.total);

        for element in 0..layout.total {
            let base = element * layout.element_stride as usize;
            for &yoffs in &layout.y_offsets {
                for &xoffs in &layout.x_offsets {
                    let mut pen = 0u8;
                    for (plane, &poffs) in layout.plane_offsets.iter().enumerate() {
                        let bit = base + (poffs + yoffs + xoffs) as usize;
                        if bit >= rom_bits {
                            return Err(GfxError::RomTooSmall {
                                rom_bits,
                                needed: bit,
                            });
                        }
                        if rom[bit / 8] & (0x80 >> (bit % 8)) != 0 {
                            pen |= 1 << (planes - 1 - plane);
                        }
                    }
                    pens.push(pen);
                }
            }
        }

        Self::from_pens(layout.width, layout.height, 1 << planes, pens)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    /// Palette entries consumed by one color code
    pub fn color_granularity(&self) -> u16 {
        self.color_granularity
    }

    /// Pens of element `code`; codes past the end wrap around.
    pub fn element(&self, code: usize) -> &[u8] {
        let size = self.width * self.height;
        let start = (code % self.total_elements) * size;
        &self.pens[start..start + size]
    }

    /// Draw element `code` with its top-left corner at (sx, sy).
    ///
    /// Each drawn pixel becomes `color_base + pen`; pixels equal to
    /// `transparent_pen` are skipped. Nothing outside `clip` (or the bitmap)
    /// is touched. Returns true if at least one pixel was written.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        bitmap: &mut IndexedBitmap,
        code: usize,
        color_base: u16,
        flip_x: bool,
        flip_y: bool,
        sx: i32,
        sy: i32,
        clip: &Rect,
        transparent_pen: u8,
    ) -> bool {
        let tile = Rect::from_size(sx, sy, self.width as i32, self.height as i32);
        let visible = tile.intersect(clip).intersect(&bitmap.bounds());
        if visible.is_empty() {
            return false;
        }

        let pens = self.element(code);
        let mut drawn = false;
        for y in visible.min_y..=visible.max_y {
            let ty = (y - sy) as usize;
            let src_y = if flip_y { self.height - 1 - ty } else { ty };
            let src_row = &pens[src_y * self.width..(src_y + 1) * self.width];
            let dst_row = bitmap.row_mut(y as usize);

            for x in visible.min_x..=visible.max_x {
                let tx = (x - sx) as usize;
                let src_x = if flip_x { self.width - 1 - tx } else { tx };
                let pen = src_row[src_x];
                if pen != transparent_pen {
                    dst_row[x as usize] = color_base.wrapping_add(pen as u16);
                    drawn = true;
                }
            }
        }
        drawn
    }
}
