//! Per-machine registry of motion-object maps.
//!
//! A board has at most [`MAX_MAPS`] independent sprite layers. Maps that fail
//! to configure stay empty: the error is logged and that layer simply draws
//! nothing.

use std::sync::Arc;

use super::desc::{MotionObjectDesc, ScreenConfig};
use super::engine::{MoFrame, MotionObjects, SpecialHandler};
use super::MoError;
use crate::graphics::{GfxElement, Rect};
use crate::logging::{log, LogCategory, LogLevel};

/// Number of map slots per machine.
pub const MAX_MAPS: usize = 2;

#[derive(Default)]
pub struct MotionObjectRegistry {
    maps: [Option<MotionObjects>; MAX_MAPS],
}

impl MotionObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure slot `map_id`, replacing whatever was there.
    ///
    /// On failure the slot is left empty and the error is both logged and
    /// returned.
    pub fn init(
        &mut self,
        map_id: usize,
        desc: &MotionObjectDesc,
        screen: ScreenConfig,
        gfx: Vec<Arc<GfxElement>>,
        special: Option<SpecialHandler>,
    ) -> Result<(), MoError> {
        let slot = self.maps.get_mut(map_id).ok_or_else(|| {
            log(LogCategory::Config, LogLevel::Error, || {
                format!("MO map {} out of range (max {})", map_id, MAX_MAPS)
            });
            MoError::InvalidMapId(map_id)
        })?;

        match MotionObjects::new(desc, screen, gfx, special) {
            Ok(map) => {
                *slot = Some(map);
                Ok(())
            }
            Err(e) => {
                log(LogCategory::Config, LogLevel::Error, || format!("MO map {}: {}", map_id, e));
                *slot = None;
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self, map_id: usize) -> bool {
        self.get(map_id).is_some()
    }

    pub fn get(&self, map_id: usize) -> Option<&MotionObjects> {
        self.maps.get(map_id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, map_id: usize) -> Option<&mut MotionObjects> {
        self.maps.get_mut(map_id).and_then(Option::as_mut)
    }

    /// Like [`get_mut`](Self::get_mut) but says why the map is unavailable.
    pub fn map_mut(&mut self, map_id: usize) -> Result<&mut MotionObjects, MoError> {
        match self.maps.get_mut(map_id) {
            None => Err(MoError::InvalidMapId(map_id)),
            Some(slot) => slot.as_mut().ok_or(MoError::MapNotInitialized(map_id)),
        }
    }

    /// Render map `map_id`; `None` if the slot is empty.
    pub fn render(&mut self, map_id: usize, clip: &Rect) -> Option<MoFrame<'_>> {
        self.get_mut(map_id).map(|map| map.render(clip))
    }

    /// Drop the map in `map_id`, freeing its tables.
    pub fn remove(&mut self, map_id: usize) -> Option<MotionObjects> {
        self.maps.get_mut(map_id).and_then(Option::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MaskDescriptor;

    fn gfx() -> Vec<Arc<GfxElement>> {
        vec![Arc::new(GfxElement::from_pens(8, 8, 16, vec![1; 64]).unwrap())]
    }

    fn desc() -> MotionObjectDesc {
        MotionObjectDesc {
            link_mask: MaskDescriptor::word(3, 0x00FF),
            x_mask: MaskDescriptor::word(2, 0x01FF),
            y_mask: MaskDescriptor::word(0, 0x01FF),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_and_render() {
        let mut registry = MotionObjectRegistry::new();
        registry.init(1, &desc(), ScreenConfig::new(64, 64), gfx(), None).unwrap();
        assert!(!registry.is_initialized(0));
        assert!(registry.is_initialized(1));
        assert!(registry.render(0, &Rect::new(0, 0, 63, 63)).is_none());

        registry.map_mut(1).unwrap().set_xscroll(4);
        let frame = registry.render(1, &Rect::new(0, 0, 63, 63)).unwrap();
        // Ring mode with an all-zero table draws 256 copies of element 0 at x = -4
        assert!(frame.rendered);
    }

    #[test]
    fn test_invalid_map_id() {
        let mut registry = MotionObjectRegistry::new();
        assert!(matches!(
            registry.init(MAX_MAPS, &desc(), ScreenConfig::new(64, 64), gfx(), None),
            Err(MoError::InvalidMapId(2))
        ));
        assert!(matches!(registry.map_mut(5), Err(MoError::InvalidMapId(5))));
        assert!(matches!(registry.map_mut(0), Err(MoError::MapNotInitialized(0))));
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let mut registry = MotionObjectRegistry::new();
        registry.init(0, &desc(), ScreenConfig::new(64, 64), gfx(), None).unwrap();

        let mut bad = desc();
        bad.gfx_index = 4;
        assert!(registry.init(0, &bad, ScreenConfig::new(64, 64), gfx(), None).is_err());
        assert!(!registry.is_initialized(0));
        assert!(registry.remove(0).is_none());
    }
}
