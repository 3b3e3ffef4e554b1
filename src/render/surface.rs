//! Offscreen render target and its readback buffer.

use image::RgbaImage;
use std::time::Duration;

use super::shader::TARGET_FORMAT;
use crate::error::{Error, Result};

type MapReceiver = tokio::sync::oneshot::Receiver<std::result::Result<(), wgpu::BufferAsyncError>>;

/// wgpu requires buffer copy rows to be 256-byte aligned.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

fn readback_size(width: u32, height: u32) -> u64 {
    padded_bytes_per_row(width) as u64 * height as u64
}

/// Check that a `width × height` target and its readback buffer fit `limits`.
pub fn check_fits(limits: &wgpu::Limits, width: u32, height: u32) -> Result<()> {
    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(Error::Render(format!(
            "{}x{} exceeds the device limit of {} per side",
            width, height, max
        )));
    }
    let size = readback_size(width, height);
    if size > limits.max_buffer_size {
        return Err(Error::Render(format!(
            "{}x{} needs a {} byte readback buffer; the device allows {}",
            width, height, size, limits.max_buffer_size
        )));
    }
    Ok(())
}

/// A render target sized to the current source image.
///
/// The readback buffer is always reallocated together with the texture, so
/// its row pitch and length match the current dimensions.
pub struct RenderSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl RenderSurface {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Palette Render Target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Palette Readback Buffer"),
            size: readback_size(width, height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self { texture, view, readback, width, height }
    }

    /// Resize to `width × height`. Returns true if the target was recreated.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if (self.width, self.height) == (width, height) {
            return false;
        }
        *self = Self::new(device, width, height);
        true
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Record a copy of the whole target into the readback buffer.
    pub fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(self.width)),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Map the readback buffer and copy its rows into an image.
    ///
    /// Must follow a submitted [`Self::copy_to_readback`].
    ///
    /// On error the buffer may be left mapped or pending a map, and the
    /// surface must not be reused.
    pub async fn read_pixels(&self, device: &wgpu::Device, timeout: Duration) -> Result<RgbaImage> {
        let receiver = self.map_readback();

        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(timeout),
            })
            .map_err(|e| Error::Readback(e.to_string()))?;

        receiver
            .await
            .map_err(|_| Error::Readback("buffer mapping was abandoned".into()))?
            .map_err(|e| Error::Readback(e.to_string()))?;

        let slice = self.readback.slice(..);
        let pitch = padded_bytes_per_row(self.width) as usize;
        let row_len = (self.width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_len * self.height as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(pitch) {
                pixels.extend_from_slice(&row[..row_len]);
            }
        }
        self.readback.unmap();

        RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| Error::Readback("readback size does not match target".into()))
    }

    /// Request a read mapping of the whole readback buffer.
    pub(crate) fn map_readback(&self) -> MapReceiver {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.readback.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        receiver
    }
}
