//! Graphics primitives shared by the arcade video services
//!
//! The motion-object engine draws decoded [`GfxElement`]s into an
//! [`IndexedBitmap`], reports the touched area as [`Rect`]s, and drivers turn
//! the result into ARGB output with [`composite_rects`].

pub mod bitmap;
pub mod compose;
pub mod gfx;
pub mod palette;
pub mod rect;

pub use bitmap::IndexedBitmap;
pub use compose::composite_rects;
pub use gfx::{GfxElement, GfxError, GfxLayout};
pub use palette::{IndexedPalette, RamPalette};
pub use rect::Rect;
