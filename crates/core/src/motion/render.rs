// Render pass: SLIP banding, active-list walk, and per-object drawing.

use super::engine::{HoldState, MoFrame, MotionObjects, SpecialObject};
use super::mask::ObjectEntry;
use super::{COLOR_MASK, PRIORITY_SHIFT};
use crate::graphics::Rect;
use crate::logging::{log, LogCategory, LogLevel};

impl MotionObjects {
    /// Draw every active object inside `clip` and report what was touched.
    ///
    /// The previous pass's rectangles are erased to the transparent pen first,
    /// so the bitmap only ever holds the current frame's objects.
    pub fn render(&mut self, clip: &Rect) -> MoFrame<'_> {
        let clip = clip.intersect(&self.screen.bounds());
        let transparent = self.transparent_pen as u16;
        for rect in self.rects.drain(..) {
            self.bitmap.fill_rect(&rect, transparent);
        }
        self.dirty.clear();

        let mut rendered = false;
        if !clip.is_empty() {
            rendered = match self.slip_shift {
                None => self.render_band(0, &clip),
                Some(shift) => self.render_slip_bands(shift, &clip),
            };
        }

        self.dirty.collect_rects(&clip, &mut self.rects);
        log(LogCategory::Render, LogLevel::Trace, || {
            format!("Clip {:?}: {} rects", clip, self.rects.len())
        });

        MoFrame {
            bitmap: &self.bitmap,
            rects: &self.rects,
            rendered,
        }
    }

    fn render_slip_bands(&mut self, shift: u32, clip: &Rect) -> bool {
        let ymask = self.bitmap_height - 1;
        let band_count = self.bitmap_height >> shift;
        let band_height = 1 << shift;

        let band_of = |y: i32| ((y + self.yscroll - self.slip_offset) & ymask) >> shift;
        let mut start = band_of(clip.min_y);
        let stop = band_of(clip.max_y);
        if start > stop {
            start -= band_count;
        }

        let mut rendered = false;
        for band in start..=stop {
            let link = self.slips.link((band & (band_count - 1)) as usize, &self.fields.link);

            let mut min_y = ((band << shift) + self.slip_offset - self.yscroll) & ymask;
            if min_y > self.screen.visible_area.max_y {
                min_y -= self.bitmap_height;
            }
            let band_clip = Rect::new(clip.min_x, min_y, clip.max_x, min_y + band_height - 1)
                .intersect(clip);
            if band_clip.is_empty() {
                continue;
            }

            rendered |= self.render_band(link, &band_clip);
        }
        rendered
    }

    fn render_band(&mut self, link: u16, clip: &Rect) -> bool {
        let traversal = self.traversal();
        self.active.prepare(&self.table, self.bank, link, &traversal);
        self.hold = HoldState::default();

        let count = self.active.len();
        let mut rendered = false;
        for i in 0..count {
            let pos = if self.reverse { count - 1 - i } else { i };
            let entry = *self.table.entry(self.active.entries()[pos]);
            rendered |= self.render_object(&entry, clip);
        }
        rendered
    }

    fn render_object(&mut self, entry: &ObjectEntry, clip: &Rect) -> bool {
        let f = self.fields;

        let code = self.code_lookup[f.code.extract(entry) as usize] as u32
            | ((f.code_high.extract(entry) as u32) << self.code_high_shift);
        let mut color = self.color_lookup[f.color.extract(entry) as usize];
        if self.color_codes != 0 {
            color %= self.color_codes;
        }
        let pen_base = (self.palette_base.wrapping_add(color.wrapping_mul(self.color_granularity))
            & COLOR_MASK)
            | (f.priority.extract(entry) << PRIORITY_SHIFT);

        let mut x = f.xpos.extract(entry) as i32;
        let mut y = f.ypos.extract(entry) as i32;
        if f.absolute.extract(entry) == 0 {
            x -= self.xscroll;
            y -= self.yscroll;
        }

        if let Some(held) = self.hold.next_x.take() {
            x = held;
        }
        if f.neighbor.extract(entry) != 0 {
            if self.next_neighbor {
                self.hold.next_x = Some(x + self.tile_width);
            } else {
                x = self.hold.last_x + self.tile_width;
            }
        }
        self.hold.last_x = x;

        x &= self.bitmap_width - 1;
        if x >= self.screen.width as i32 {
            x -= self.bitmap_width;
        }
        y &= self.bitmap_height - 1;
        if y >= self.screen.height as i32 {
            y -= self.bitmap_height;
        }

        if !f.special.is_unused() && f.special.extract(entry) == self.special_value {
            return self.render_special(entry, code, pen_base, x, y, clip);
        }

        let gfx_index = self.gfx_lookup[f.gfx.extract(entry) as usize] as usize;
        let Some(gfx) = self.gfx.get(gfx_index) else {
            log(LogCategory::Render, LogLevel::Debug, || {
                format!("Object {:04X?} selects missing graphics set {}", entry.words, gfx_index)
            });
            return false;
        };

        let width = f.width.extract(entry) as i32 + 1;
        let height = f.height.extract(entry) as i32 + 1;
        let (tile_w, tile_h) = (self.tile_width, self.tile_height);
        let flip_x = f.hflip.extract(entry) != 0;
        let flip_y = f.vflip.extract(entry) != 0;

        let mut x_adv = tile_w;
        if flip_x {
            x += (width - 1) * tile_w;
            x_adv = -tile_w;
        }
        let mut y_adv = tile_h;
        if flip_y {
            y += (height - 1) * tile_h;
            y_adv = -tile_h;
        }

        // Row-major tiles, or column-major when the board swaps axes
        let (outer, inner) = if self.swap_xy { (width, height) } else { (height, width) };
        let transparent = self.transparent_pen;
        let mut code = code as usize;
        let mut rendered = false;

        for o in 0..outer {
            let (ox, oy) = if self.swap_xy { (x + o * x_adv, y) } else { (x, y + o * y_adv) };
            let line_visible = if self.swap_xy {
                ox + tile_w > clip.min_x && ox <= clip.max_x
            } else {
                oy + tile_h > clip.min_y && oy <= clip.max_y
            };
            if !line_visible {
                code += inner as usize;
                continue;
            }

            for i in 0..inner {
                let (sx, sy) = if self.swap_xy { (ox, oy + i * y_adv) } else { (ox + i * x_adv, oy) };
                let tile_visible = if self.swap_xy {
                    sy + tile_h > clip.min_y && sy <= clip.max_y
                } else {
                    sx + tile_w > clip.min_x && sx <= clip.max_x
                };
                if tile_visible {
                    // A tile inside the clip counts as rendered even if every
                    // pixel was transparent, so the draw result is not needed
                    gfx.draw(&mut self.bitmap, code, pen_base, flip_x, flip_y, sx, sy, clip, transparent);
                    self.dirty.mark(&Rect::from_size(sx, sy, tile_w, tile_h).intersect(clip));
                    rendered = true;
                }
                code += 1;
            }
        }
        rendered
    }

    fn render_special(&mut self, entry: &ObjectEntry, code: u32, color: u16, x: i32, y: i32, clip: &Rect) -> bool {
        let Some(handler) = self.special.as_mut() else {
            log(LogCategory::Special, LogLevel::Debug, || {
                format!("Special object at ({}, {}) with no handler installed", x, y)
            });
            return false;
        };

        let object = SpecialObject {
            code,
            color,
            x,
            y,
            entry: *entry,
        };
        log(LogCategory::Special, LogLevel::Trace, || format!("{:?}", object));

        match handler(&mut self.bitmap, clip, &object).map(|r| r.intersect(clip)) {
            Some(touched) if !touched.is_empty() => {
                self.dirty.mark(&touched);
                true
            }
            _ => false,
        }
    }
}
