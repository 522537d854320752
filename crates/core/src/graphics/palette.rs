//! Indexed palettes mapping pens to ARGB8888 colors.
//!
//! Motion-object pixels are palette indices with the priority tag in the top
//! bits; once the tag is stripped they are looked up here. Atari boards in
//! particular store palette RAM as 16-bit IIII RRRR GGGG BBBB words, which
//! [`RamPalette::write_irgb`] decodes.

/// Opaque black, returned for indices outside the palette.
pub const BLACK: u32 = 0xFF00_0000;

/// Intensity scale for IRGB palette words; a full-scale channel at full
/// intensity reaches 15 * 0x11 = 0xFF.
const IRGB_INTENSITY: [u32; 16] = [
    0x00, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11,
];

/// Palette lookup as seen by the compositor.
pub trait IndexedPalette {
    /// ARGB color (0xAARRGGBB) for `index`.
    fn get_color(&self, index: usize) -> u32;

    fn set_color(&mut self, index: usize, color: u32);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Palette backed by plain RAM, as on most arcade boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamPalette {
    colors: Vec<u32>,
}

impl RamPalette {
    /// `size` entries of opaque black
    pub fn new(size: usize) -> Self {
        Self {
            colors: vec![BLACK; size],
        }
    }

    pub fn from_colors(colors: Vec<u32>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Store a palette-RAM word in IIII RRRR GGGG BBBB format.
    pub fn write_irgb(&mut self, index: usize, word: u16) {
        let intensity = IRGB_INTENSITY[(word >> 12) as usize & 0xF];
        let channel = |shift: u16| ((word >> shift) & 0xF) as u32 * intensity;
        let color = BLACK | (channel(8) << 16) | (channel(4) << 8) | channel(0);
        self.set_color(index, color);
    }
}

impl IndexedPalette for RamPalette {
    fn get_color(&self, index: usize) -> u32 {
        self.colors.get(index).copied().unwrap_or(BLACK)
    }

    fn set_color(&mut self, index: usize, color: u32) {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color;
        }
    }

    fn len(&self) -> usize {
        self.colors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_palette_is_black() {
        let palette = RamPalette::new(16);
        assert_eq!(palette.len(), 16);
        assert!((0..16).all(|i| palette.get_color(i) == BLACK));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut palette = RamPalette::new(2);
        palette.set_color(5, 0xFFFF_FFFF);
        assert_eq!(palette.get_color(5), BLACK);
        assert_eq!(palette.colors(), &[BLACK, BLACK]);
    }

    #[test]
    fn test_irgb_full_white() {
        let mut palette = RamPalette::new(4);
        palette.write_irgb(1, 0xFFFF);
        assert_eq!(palette.get_color(1), 0xFFFF_FFFF);
    }

    #[test]
    fn test_irgb_zero_intensity_is_black() {
        let mut palette = RamPalette::new(4);
        palette.write_irgb(2, 0x0FFF);
        assert_eq!(palette.get_color(2), BLACK);
    }

    #[test]
    fn test_irgb_channels() {
        let mut palette = RamPalette::new(1);
        // Intensity 8 (scale 0x0A): red 0xF, green 0x1, blue 0
        palette.write_irgb(0, 0x8F10);
        assert_eq!(palette.get_color(0), 0xFF96_0A00);
    }
}
