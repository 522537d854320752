//! Merging a motion-object bitmap into an ARGB frame.
//!
//! Only the rectangles reported by the last render are visited; everything
//! else in the MO bitmap is known to be transparent.

use super::bitmap::IndexedBitmap;
use super::palette::IndexedPalette;
use super::rect::Rect;
use crate::motion::{COLOR_MASK, PRIORITY_SHIFT};
use crate::types::Frame;

/// Copy every non-transparent MO pixel inside `rects` into `frame`.
///
/// `mo_wins(x, y, priority)` decides, per pixel, whether the object beats
/// whatever playfield pixel is already in the frame; `priority` is the tag the
/// engine folded into the pixel's top bits. Returns the number of pixels
/// written.
pub fn composite_rects<P, F>(
    bitmap: &IndexedBitmap,
    rects: &[Rect],
    transparent: u16,
    palette: &P,
    frame: &mut Frame,
    mut mo_wins: F,
) -> usize
where
    P: IndexedPalette + ?Sized,
    F: FnMut(i32, i32, u16) -> bool,
{
    let frame_bounds = Rect::from_size(0, 0, frame.width as i32, frame.height as i32);
    let bounds = bitmap.bounds().intersect(&frame_bounds);
    let mut written = 0;

    for rect in rects {
        let r = rect.intersect(&bounds);
        if r.is_empty() {
            continue;
        }
        for y in r.min_y..=r.max_y {
            let src = bitmap.row(y as usize);
            let dst_row = y as usize * frame.width as usize;
            for x in r.min_x..=r.max_x {
                let pen = src[x as usize];
                if pen == transparent || !mo_wins(x, y, pen >> PRIORITY_SHIFT) {
                    continue;
                }
                frame.pixels[dst_row + x as usize] = palette.get_color((pen & COLOR_MASK) as usize);
                written += 1;
            }
        }
    }
    written
}
