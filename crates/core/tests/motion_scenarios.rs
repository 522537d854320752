//! End-to-end rendering scenarios for the motion-object engine.
//!
//! All tests share one board layout:
//! - word 0: code (bits 0-10)
//! - word 1: y (bits 0-8), height-1 (bits 12-13), neighbor (bit 15)
//! - word 2: x (bits 0-8), width-1 (bits 9-10), priority (bits 12-15)
//! - word 3: link (bits 0-9), color (bits 12-15)

use std::sync::Arc;

use arcade_core::graphics::{GfxElement, Rect};
use arcade_core::motion::{
    MaskDescriptor, MotionObjectDesc, MotionObjects, ObjectEntry, ScreenConfig, PRIORITY_SHIFT,
};

const FULL: Rect = Rect::new(0, 0, 255, 255);

fn desc() -> MotionObjectDesc {
    MotionObjectDesc {
        linked: true,
        code_mask: MaskDescriptor::word(0, 0x07FF),
        y_mask: MaskDescriptor::word(1, 0x01FF),
        height_mask: MaskDescriptor::word(1, 0x3000),
        neighbor_mask: MaskDescriptor::word(1, 0x8000),
        x_mask: MaskDescriptor::word(2, 0x01FF),
        width_mask: MaskDescriptor::word(2, 0x0600),
        priority_mask: MaskDescriptor::word(2, 0xF000),
        link_mask: MaskDescriptor::word(3, 0x03FF),
        color_mask: MaskDescriptor::word(3, 0xF000),
        ..Default::default()
    }
}

/// 16 elements of 16x16. Element n is pen n with pen 15 in its top-left
/// corner; element 0 is fully transparent.
fn gfx() -> Vec<Arc<GfxElement>> {
    let mut pens = Vec::with_capacity(16 * 256);
    for n in 0..16u8 {
        let mut element = [n; 256];
        if n != 0 {
            element[0] = 15;
        }
        pens.extend_from_slice(&element);
    }
    vec![Arc::new(GfxElement::from_pens(16, 16, 16, pens).unwrap())]
}

fn engine(desc: &MotionObjectDesc) -> MotionObjects {
    MotionObjects::new(desc, ScreenConfig::new(256, 256), gfx(), None).unwrap()
}

fn object(x: u16, y: u16, code: u16, link: u16) -> ObjectEntry {
    ObjectEntry::new([code, y, x, link])
}

#[test]
fn test_basic_sprite_draw() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(100, 50, 5, 0));

    let frame = mo.render(&FULL);
    assert!(frame.rendered);

    // Tile artwork lands at (100, 50)
    assert_eq!(frame.bitmap.pixel(100, 50), Some(15));
    assert_eq!(frame.bitmap.pixel(101, 50), Some(5));
    assert_eq!(frame.bitmap.pixel(115, 65), Some(5));
    assert_eq!(frame.bitmap.pixel(99, 50), Some(0));
    assert_eq!(frame.bitmap.pixel(116, 50), Some(0));

    // Rects are snapped to the 16x16 grid; the first one covers the
    // top-left block of the object
    assert!(!frame.rects.is_empty());
    assert!(frame.rects[0].contains_rect(&Rect::new(96, 48, 111, 63)));
    let covered = |x, y| frame.rects.iter().any(|r| r.contains(x, y));
    assert!(covered(100, 50) && covered(115, 65));
    assert!(!covered(95, 50) && !covered(100, 47));
}

#[test]
fn test_priority_encoding() {
    let mut mo = engine(&desc());
    let mut high = object(64, 0, 3, 0);
    high.words[2] |= 3 << 12;
    mo.set_entry(0, object(0, 0, 3, 1));
    mo.set_entry(1, high);

    let frame = mo.render(&FULL);
    let low = frame.bitmap.pixel(1, 1).unwrap();
    let high = frame.bitmap.pixel(65, 1).unwrap();
    assert_eq!(low, 3);
    assert_eq!(high - low, 3 << PRIORITY_SHIFT);
}

#[test]
fn test_color_and_palette_base() {
    let mut mo = engine(&desc());
    let mut entry = object(0, 0, 2, 0);
    entry.words[3] |= 5 << 12;
    mo.set_entry(0, entry);
    mo.set_palette_base(0x100);

    let frame = mo.render(&FULL);
    assert_eq!(frame.bitmap.pixel(1, 1), Some(0x100 + 5 * 16 + 2));
}

#[test]
fn test_slip_banding() {
    let mut d = desc();
    d.slip_height = 16;
    let mut mo = engine(&d);
    assert_eq!(mo.slip_band_count(), 32);

    mo.write_slip(2, 40, 0xFFFF);
    mo.write_slip(3, 0, 0xFFFF);
    mo.set_entry(40, object(16, 32, 1, 40));
    mo.set_entry(0, object(48, 48, 2, 0));

    let frame = mo.render(&Rect::new(0, 32, 255, 63));
    assert!(frame.rendered);
    assert_eq!(frame.bitmap.pixel(17, 33), Some(1));
    assert_eq!(frame.bitmap.pixel(49, 49), Some(2));

    // One build per band, band 3 did not reuse band 2's list
    assert_eq!(mo.active_list_builds(), 2);
    assert_eq!(mo.active_entries(), &[0]);
}

#[test]
fn test_slip_band_clips_objects() {
    let mut d = desc();
    d.slip_height = 16;
    let mut mo = engine(&d);

    // Band 2 starts an object two tiles tall; band 3 has an empty list
    mo.write_slip(2, 40, 0xFFFF);
    mo.write_slip(3, 1, 0xFFFF);
    let mut tall = object(0, 32, 1, 40);
    tall.words[1] |= 1 << 12;
    mo.set_entry(40, tall);

    let frame = mo.render(&Rect::new(0, 32, 255, 63));
    assert_eq!(frame.bitmap.pixel(1, 40), Some(1));
    assert_eq!(frame.bitmap.pixel(1, 50), Some(0));
}

#[test]
fn test_yscroll_moves_slip_bands() {
    let mut d = desc();
    d.slip_height = 16;
    let mut mo = engine(&d);
    mo.set_yscroll(16);

    // Screen line 16 is band 2 once scrolled by 16
    mo.write_slip(2, 7, 0xFFFF);
    mo.set_entry(7, object(0, 32, 1, 7));

    let frame = mo.render(&Rect::new(0, 16, 255, 31));
    assert!(frame.rendered);
    assert_eq!(frame.bitmap.pixel(1, 17), Some(1));
}

#[test]
fn test_active_list_cache() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(0, 0, 1, 0));

    mo.render(&FULL);
    mo.render(&FULL);
    assert_eq!(mo.active_list_builds(), 1);

    mo.write_packed(0, 2, 0xFFFF);
    let frame = mo.render(&FULL);
    assert_eq!(frame.bitmap.pixel(1, 1), Some(2));
    assert_eq!(mo.active_list_builds(), 2);

    mo.set_bank(0);
    mo.render(&FULL);
    assert_eq!(mo.active_list_builds(), 2);
}

#[test]
fn test_cyclic_tables_terminate() {
    let mut mo = engine(&desc());
    for i in 0..1024u16 {
        mo.set_entry(i as usize, object(300, 300, 0, (i + 1) % 1024));
    }
    mo.render(&FULL);
    assert_eq!(mo.active_entries().len(), 1024);

    // Two entries pointing at each other
    mo.set_entry(0, object(300, 300, 0, 1));
    mo.set_entry(1, object(300, 300, 0, 0));
    mo.render(&FULL);
    assert_eq!(mo.active_entries(), &[0, 1]);
}

#[test]
fn test_max_per_line_caps_list() {
    let mut d = desc();
    d.linked = false;
    d.max_per_line = 8;
    let mut mo = engine(&d);
    mo.render(&FULL);
    assert_eq!(mo.active_entries(), &[0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_neighbor_follows_previous_object() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(40, 80, 1, 1));
    // X fields are ignored for neighbors
    mo.set_entry(1, object(200, 80, 2, 2).with_neighbor());
    mo.set_entry(2, object(7, 80, 3, 2).with_neighbor());

    let frame = mo.render(&FULL);
    assert_eq!(frame.bitmap.pixel(41, 81), Some(1));
    assert_eq!(frame.bitmap.pixel(57, 81), Some(2));
    assert_eq!(frame.bitmap.pixel(73, 81), Some(3));
    assert_eq!(frame.bitmap.pixel(201, 81), Some(0));
}

#[test]
fn test_next_neighbor_positions_following_object() {
    let mut d = desc();
    d.next_neighbor = true;
    let mut mo = engine(&d);
    mo.set_entry(0, object(40, 80, 1, 1).with_neighbor());
    mo.set_entry(1, object(200, 80, 2, 2));
    mo.set_entry(2, object(100, 120, 3, 2));

    let frame = mo.render(&FULL);
    assert_eq!(frame.bitmap.pixel(41, 81), Some(1));
    assert_eq!(frame.bitmap.pixel(57, 81), Some(2));
    // Hold is consumed by one object only
    assert_eq!(frame.bitmap.pixel(101, 121), Some(3));
}

#[test]
fn test_adjacent_objects_coalesce() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(32, 48, 1, 1));
    mo.set_entry(1, object(48, 48, 1, 2));
    mo.set_entry(2, object(64, 48, 1, 2));

    let frame = mo.render(&FULL);
    assert_eq!(frame.rects, &[Rect::new(32, 48, 79, 63)]);
}

#[test]
fn test_gap_splits_rects() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(32, 48, 1, 1));
    mo.set_entry(1, object(64, 48, 1, 1));

    let frame = mo.render(&FULL);
    assert_eq!(
        frame.rects,
        &[Rect::new(32, 48, 47, 63), Rect::new(64, 48, 79, 63)]
    );
}

#[test]
fn test_object_outside_clip_draws_nothing() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(200, 200, 1, 0));

    let frame = mo.render(&Rect::new(0, 0, 127, 127));
    assert!(!frame.rendered);
    assert!(frame.rects.is_empty());
    assert!(frame.bitmap.pixels().iter().all(|&p| p == 0));
}

#[test]
fn test_partial_clip_cuts_object() {
    let mut mo = engine(&desc());
    mo.set_entry(0, object(120, 0, 1, 0));

    let frame = mo.render(&Rect::new(0, 0, 127, 255));
    assert!(frame.rendered);
    assert_eq!(frame.bitmap.pixel(127, 1), Some(1));
    assert_eq!(frame.bitmap.pixel(128, 1), Some(0));
    assert!(frame.rects.iter().all(|r| r.max_x <= 127));
}

#[test]
fn test_multi_tile_vflip_with_clipped_rows() {
    let mut d = desc();
    d.vflip_mask = MaskDescriptor::word(0, 0x8000);
    let mut mo = engine(&d);
    // 1x3 object, vflipped: codes 1, 2, 3 run bottom to top
    let mut entry = object(0, 0, 0x8000 | 1, 0);
    entry.words[1] |= 2 << 12;
    mo.set_entry(0, entry);

    // Clip away the bottom row; the remaining rows still get the right codes
    let frame = mo.render(&Rect::new(0, 0, 255, 31));
    assert_eq!(frame.bitmap.pixel(1, 1), Some(3));
    assert_eq!(frame.bitmap.pixel(1, 17), Some(2));
    assert_eq!(frame.bitmap.pixel(1, 33), Some(0));
}

trait NeighborExt {
    fn with_neighbor(self) -> Self;
}

impl NeighborExt for ObjectEntry {
    fn with_neighbor(mut self) -> Self {
        self.words[1] |= 0x8000;
        self
    }
}
