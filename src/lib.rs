//! Palette Filter
//!
//! Remaps an image's colors through a named lookup table on the GPU. The
//! source image's red channel indexes the palette; the result is encoded as
//! PNG and swapped into the image element under a `blob:` locator.

pub mod blob;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod palette;
pub mod render;

pub use config::{EngineConfig, PaletteInput};
pub use element::ImageElement;
pub use engine::{PaletteEngine, SkipReason, TransformOutcome};
pub use error::{Error, Result};
pub use palette::{Palette, PaletteSet};
