//! Tile-granular dirty tracking for the motion-object bitmap.
//!
//! The grid keeps one cell per tile-sized block plus a one-cell border on
//! every side, so objects hanging off the screen edge never index out of
//! range. After a pass the grid is collapsed into rectangles: horizontal runs
//! of dirty cells merge, rows never do.

use crate::graphics::Rect;

#[derive(Debug, Clone)]
pub struct DirtyGrid {
    cells: Vec<bool>,
    /// Row stride, border included
    stride: usize,
    rows: usize,
    tile_x_shift: u32,
    tile_y_shift: u32,
}

impl DirtyGrid {
    /// Grid covering a `screen_width` x `screen_height` screen in blocks of
    /// `1 << tile_x_shift` by `1 << tile_y_shift` pixels.
    pub fn new(screen_width: usize, screen_height: usize, tile_x_shift: u32, tile_y_shift: u32) -> Self {
        let stride = (screen_width >> tile_x_shift) + 2;
        let rows = (screen_height >> tile_y_shift) + 2;
        Self {
            cells: vec![false; stride * rows],
            stride,
            rows,
            tile_x_shift,
            tile_y_shift,
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    fn index(&self, cx: i32, cy: i32) -> Option<usize> {
        let x = usize::try_from(cx + 1).ok().filter(|&x| x < self.stride)?;
        let y = usize::try_from(cy + 1).ok().filter(|&y| y < self.rows)?;
        Some(y * self.stride + x)
    }

    /// Mark every block `rect` touches.
    pub fn mark(&mut self, rect: &Rect) {
        if rect.is_empty() {
            return;
        }
        for cy in (rect.min_y >> self.tile_y_shift)..=(rect.max_y >> self.tile_y_shift) {
            for cx in (rect.min_x >> self.tile_x_shift)..=(rect.max_x >> self.tile_x_shift) {
                if let Some(i) = self.index(cx, cy) {
                    self.cells[i] = true;
                }
            }
        }
    }

    /// Whether block (cx, cy) is dirty; (-1, -1) is the top-left border cell.
    pub fn is_dirty(&self, cx: i32, cy: i32) -> bool {
        self.index(cx, cy).is_some_and(|i| self.cells[i])
    }

    /// Replace `out` with the dirty area inside `clip`, as clipped rectangles.
    pub fn collect_rects(&self, clip: &Rect, out: &mut Vec<Rect>) {
        out.clear();
        if clip.is_empty() {
            return;
        }
        let tile_w = 1 << self.tile_x_shift;
        let tile_h = 1 << self.tile_y_shift;

        for cy in (clip.min_y >> self.tile_y_shift)..=(clip.max_y >> self.tile_y_shift) {
            let mut previous_dirty = false;
            for cx in (clip.min_x >> self.tile_x_shift)..=(clip.max_x >> self.tile_x_shift) {
                let dirty = self.is_dirty(cx, cy);
                if dirty {
                    match out.last_mut() {
                        Some(last) if previous_dirty => last.max_x += tile_w,
                        _ => out.push(Rect::from_size(
                            cx << self.tile_x_shift,
                            cy << self.tile_y_shift,
                            tile_w,
                            tile_h,
                        )),
                    }
                }
                previous_dirty = dirty;
            }
        }

        for rect in out.iter_mut() {
            *rect = rect.intersect(clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DirtyGrid {
        DirtyGrid::new(256, 240, 4, 4)
    }

    fn rects(grid: &DirtyGrid, clip: Rect) -> Vec<Rect> {
        let mut out = Vec::new();
        grid.collect_rects(&clip, &mut out);
        out
    }

    #[test]
    fn test_adjacent_blocks_merge_horizontally() {
        let mut g = grid();
        g.mark(&Rect::new(32, 48, 79, 63));
        assert_eq!(rects(&g, Rect::new(0, 0, 255, 239)), vec![Rect::new(32, 48, 79, 63)]);
    }

    #[test]
    fn test_gap_splits_rects() {
        let mut g = grid();
        g.mark(&Rect::new(32, 48, 47, 63));
        g.mark(&Rect::new(64, 48, 79, 63));
        assert_eq!(
            rects(&g, Rect::new(0, 0, 255, 239)),
            vec![Rect::new(32, 48, 47, 63), Rect::new(64, 48, 79, 63)]
        );
    }

    #[test]
    fn test_rows_do_not_merge() {
        let mut g = grid();
        g.mark(&Rect::new(100, 50, 115, 65));
        assert_eq!(
            rects(&g, Rect::new(0, 0, 255, 239)),
            vec![Rect::new(96, 48, 127, 63), Rect::new(96, 64, 127, 79)]
        );
    }

    #[test]
    fn test_rects_are_clipped() {
        let mut g = grid();
        g.mark(&Rect::new(0, 0, 31, 15));
        assert_eq!(rects(&g, Rect::new(8, 4, 20, 10)), vec![Rect::new(8, 4, 20, 10)]);
    }

    #[test]
    fn test_off_screen_marks_use_border() {
        let mut g = grid();
        g.mark(&Rect::new(-16, -16, -1, -1));
        assert!(g.is_dirty(-1, -1));
        // Far outside is dropped rather than wrapping
        g.mark(&Rect::new(-100, 0, -90, 0));
        assert!(!g.is_dirty(-7, 0));
        assert!(rects(&g, Rect::new(0, 0, 255, 239)).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut g = grid();
        g.mark(&Rect::new(0, 0, 0, 0));
        g.clear();
        assert!(!g.is_dirty(0, 0));
    }
}
