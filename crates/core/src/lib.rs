//! Arcade video primitives: a table-driven motion-object engine and the
//! graphics pieces it draws with.

pub mod graphics;
pub mod logging;
pub mod motion;
pub mod types {
    use serde::{Deserialize, Serialize};

    /// ARGB8888 framebuffer handed to the frontend.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }
    }
}
