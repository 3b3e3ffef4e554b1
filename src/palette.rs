//! Palette color tables and their file form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::PaletteInput;
use crate::error::{Error, Result};

/// Largest palette the 8-bit red channel can index.
pub const MAX_COLORS: usize = 256;

/// An immutable, validated list of RGB colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Build a palette from a flat `[r, g, b, r, g, b, ...]` sequence.
    ///
    /// A trailing partial triplet is dropped under [`PaletteInput::Truncate`]
    /// and rejected under [`PaletteInput::Strict`]. The resulting color count
    /// must be within `1..=MAX_COLORS`.
    pub fn from_triplets(name: &str, values: &[u8], input: PaletteInput) -> Result<Self> {
        let remainder = values.len() % 3;
        if remainder != 0 {
            match input {
                PaletteInput::Strict => {
                    return Err(Error::MalformedPalette {
                        name: name.to_string(),
                        len: values.len(),
                    });
                }
                PaletteInput::Truncate => {
                    tracing::warn!(
                        "Palette \"{}\": dropping {} trailing value(s) of a partial triplet",
                        name,
                        remainder
                    );
                }
            }
        }

        let colors: Vec<[u8; 3]> = values
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        if colors.is_empty() || colors.len() > MAX_COLORS {
            return Err(Error::PaletteSize {
                name: name.to_string(),
                colors: colors.len(),
            });
        }

        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; palettes hold at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// RGBA texel bytes for the lookup texture, alpha forced to 255.
    pub fn texels(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.colors.len() * 4);
        for [r, g, b] in &self.colors {
            out.extend_from_slice(&[*r, *g, *b, 255]);
        }
        out
    }
}

/// Named palettes as stored on disk: `{"name": [r, g, b, ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteSet {
    entries: BTreeMap<String, Vec<u8>>,
}

impl PaletteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a palette file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<u8>) {
        self.entries.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
