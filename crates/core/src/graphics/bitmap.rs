//! 16-bit indexed bitmap that motion objects are drawn into.
//!
//! Pixels are pen values, not colors: the low bits select a palette entry and
//! the high bits carry the priority tag the downstream compositor resolves.

use super::rect::Rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBitmap {
    width: usize,
    height: usize,
    pixels: Vec<u16>,
}

impl IndexedBitmap {
    /// Create a bitmap with every pixel set to `fill`
    pub fn new(width: usize, height: usize, fill: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole bitmap as a rectangle
    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width as i32, self.height as i32)
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn fill(&mut self, value: u16) {
        self.pixels.fill(value);
    }

    /// Fill the part of `rect` that lies inside the bitmap.
    pub fn fill_rect(&mut self, rect: &Rect, value: u16) {
        let r = rect.intersect(&self.bounds());
        if r.is_empty() {
            return;
        }
        for y in r.min_y..=r.max_y {
            let row = y as usize * self.width;
            self.pixels[row + r.min_x as usize..=row + r.max_x as usize].fill(value);
        }
    }

    /// Pixel at (x, y), or `None` outside the bitmap.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u16> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Out-of-range writes are ignored.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u16) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = value;
        }
    }

    /// Row `y`; panics if `y` is outside the bitmap.
    pub fn row(&self, y: usize) -> &[u16] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
        &mut self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_every_pixel() {
        let bitmap = IndexedBitmap::new(8, 4, 0x0F);
        assert_eq!(bitmap.pixels().len(), 32);
        assert!(bitmap.pixels().iter().all(|&p| p == 0x0F));
    }

    #[test]
    fn test_fill_rect_clips_to_bounds() {
        let mut bitmap = IndexedBitmap::new(8, 8, 0);
        bitmap.fill_rect(&Rect::new(-4, 6, 1, 20), 7);

        assert_eq!(bitmap.pixel(0, 6), Some(7));
        assert_eq!(bitmap.pixel(1, 7), Some(7));
        assert_eq!(bitmap.pixel(2, 7), Some(0));
        assert_eq!(bitmap.pixel(0, 5), Some(0));
    }

    #[test]
    fn test_out_of_range_access() {
        let mut bitmap = IndexedBitmap::new(4, 4, 0);
        bitmap.set_pixel(-1, 0, 9);
        bitmap.set_pixel(4, 0, 9);
        assert_eq!(bitmap.pixel(4, 0), None);
        assert_eq!(bitmap.pixel(0, -1), None);
        assert!(bitmap.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_rows() {
        let mut bitmap = IndexedBitmap::new(4, 2, 0);
        bitmap.row_mut(1)[2] = 5;
        assert_eq!(bitmap.row(1), &[0, 0, 5, 0]);
        assert_eq!(bitmap.pixel(2, 1), Some(5));
    }
}
