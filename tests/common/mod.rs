//! Shared test helpers.

use image::{Rgba, RgbaImage};
use palette_filter::{EngineConfig, Error, PaletteEngine};

/// Palette of two entries: index 0 black, index 1 white.
#[allow(dead_code)]
pub const BLACK_WHITE: [u8; 6] = [0, 0, 0, 255, 255, 255];

/// Try to create an engine for GPU tests.
/// Returns None if no adapter is available (e.g., headless CI).
#[allow(dead_code)]
pub fn try_engine() -> Option<PaletteEngine> {
    try_engine_with(EngineConfig::default())
}

/// Like [`try_engine`], retrying with a software adapter before giving up.
#[allow(dead_code)]
pub fn try_engine_with(config: EngineConfig) -> Option<PaletteEngine> {
    match PaletteEngine::new(config.clone()) {
        Ok(engine) => return Some(engine),
        Err(Error::EnvironmentUnavailable(e)) => {
            eprintln!("No default adapter ({}), trying fallback", e);
        }
        Err(e) => panic!("Engine bootstrap failed: {}", e),
    }

    let fallback = EngineConfig { force_fallback_adapter: true, ..config };
    match PaletteEngine::new(fallback) {
        Ok(engine) => Some(engine),
        Err(Error::EnvironmentUnavailable(e)) => {
            eprintln!("Skipping: no GPU adapter available ({})", e);
            None
        }
        Err(e) => panic!("Engine bootstrap failed: {}", e),
    }
}

/// A `width × height` image filled with one color.
#[allow(dead_code)]
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Every pixel of `img` equals `rgba`.
#[allow(dead_code)]
pub fn assert_uniform(img: &RgbaImage, rgba: [u8; 4]) {
    for (x, y, p) in img.enumerate_pixels() {
        assert_eq!(p.0, rgba, "pixel ({}, {}) differs", x, y);
    }
}
