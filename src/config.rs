//! Engine configuration.
//!
//! Stored as JSON at `~/.config/palette-filter/config.json` unless a path is
//! given explicitly. Every field has a default, so a partial file (or `{}`)
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("palette-filter")
        .join("config.json")
}

/// Which wgpu backends the instance may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    All,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl Backend {
    pub fn to_wgpu(self) -> wgpu::Backends {
        match self {
            Backend::All => wgpu::Backends::all(),
            Backend::Vulkan => wgpu::Backends::VULKAN,
            Backend::Metal => wgpu::Backends::METAL,
            Backend::Dx12 => wgpu::Backends::DX12,
            Backend::Gl => wgpu::Backends::GL,
        }
    }
}

/// Adapter power preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    #[default]
    Default,
    Low,
    High,
}

impl Power {
    pub fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            Power::Default => wgpu::PowerPreference::default(),
            Power::Low => wgpu::PowerPreference::LowPower,
            Power::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// What to do with a palette whose value count is not a multiple of 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteInput {
    /// Drop the trailing partial triplet and log a warning.
    #[default]
    Truncate,
    /// Reject the palette with `Error::MalformedPalette`.
    Strict,
}

/// Settings for a [`crate::PaletteEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub power_preference: Power,
    /// Ask for a software adapter (useful on headless CI).
    #[serde(default)]
    pub force_fallback_adapter: bool,
    /// Upper bound on waiting for the GPU to finish a readback.
    #[serde(default = "default_readback_timeout_ms")]
    pub readback_timeout_ms: u64,
    #[serde(default)]
    pub palette_input: PaletteInput,
}

fn default_readback_timeout_ms() -> u64 { 10_000 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            power_preference: Power::default(),
            force_fallback_adapter: false,
            readback_timeout_ms: default_readback_timeout_ms(),
            palette_input: PaletteInput::default(),
        }
    }
}

impl EngineConfig {
    /// Load from the default path, falling back to defaults on any error.
    pub fn load() -> Self {
        match Self::load_from(&default_path()) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default engine config: {}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn readback_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.readback_timeout_ms)
    }
}
