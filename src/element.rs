//! Image elements: a decoded bitmap plus its source locator and annotations.

use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Annotation key naming the palette to apply.
pub const PALETTE_KEY: &str = "palette";

/// A decoded image with the attributes a transform reads and writes.
///
/// The bitmap must be fully decoded before it is handed to
/// [`crate::PaletteEngine::transform`].
#[derive(Debug, Clone)]
pub struct ImageElement {
    src: String,
    dataset: BTreeMap<String, String>,
    bitmap: RgbaImage,
}

impl ImageElement {
    /// Wrap an already-decoded bitmap.
    pub fn new(src: impl Into<String>, bitmap: RgbaImage) -> Self {
        Self {
            src: src.into(),
            dataset: BTreeMap::new(),
            bitmap,
        }
    }

    /// Decode an image file; `src` becomes the path.
    pub fn open(path: &Path) -> Result<Self> {
        let bitmap = image::open(path)?.to_rgba8();
        Ok(Self::new(path.display().to_string(), bitmap))
    }

    /// Builder form of [`Self::set_palette`].
    pub fn with_palette(mut self, name: impl Into<String>) -> Self {
        self.set_palette(name);
        self
    }

    pub fn set_palette(&mut self, name: impl Into<String>) {
        self.dataset.insert(PALETTE_KEY.to_string(), name.into());
    }

    /// Name of the palette this element asks for.
    pub fn palette(&self) -> Option<&str> {
        self.data(PALETTE_KEY)
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.dataset.insert(key.into(), value.into());
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn natural_width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Point the element at a new source whose decoded pixels are `bitmap`.
    pub(crate) fn swap_source(&mut self, src: String, bitmap: RgbaImage) {
        self.src = src;
        self.bitmap = bitmap;
    }
}
