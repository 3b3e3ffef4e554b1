use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GPU environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("Shader compile error: {log}")]
    ShaderCompile { log: String },

    #[error("Program link error: {log}")]
    ProgramLink { log: String },

    #[error("Binding \"{0}\" not found in program")]
    UnknownBinding(String),

    #[error("Palette \"{name}\" has {len} values, which is not a multiple of 3")]
    MalformedPalette { name: String, len: usize },

    #[error("Palette \"{name}\" has {colors} colors; expected 1 to 256")]
    PaletteSize { name: String, colors: usize },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Readback failed: {0}")]
    Readback(String),

    #[error("Image error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<wgpu::RequestAdapterError> for Error {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        Error::EnvironmentUnavailable(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for Error {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Error::EnvironmentUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
