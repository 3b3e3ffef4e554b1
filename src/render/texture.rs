//! Texture creation for source bitmaps and palette lookup tables.
//!
//! Both kinds get the same treatment on the sampling side: one shared
//! nearest-filtered, clamp-to-edge sampler.

use image::RgbaImage;

use crate::palette::Palette;

/// Create the sampler shared by the image and palette bindings.
pub fn create_lookup_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Palette Lookup Sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// A palette resident on the GPU as an N×1 RGBA texture.
pub struct LookupTexture {
    palette: Palette,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl std::fmt::Debug for LookupTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupTexture")
            .field("colors", &self.palette.len())
            .finish()
    }
}

impl LookupTexture {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Upload a palette as a `len × 1` lookup table.
pub fn upload_lookup_table(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    palette: Palette,
) -> LookupTexture {
    let width = palette.len() as u32;
    let texture = upload_rgba(
        device,
        queue,
        &format!("Palette LUT \"{}\"", name),
        width,
        1,
        &palette.texels(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    LookupTexture { palette, _texture: texture, view }
}

/// Upload a decoded bitmap at its natural size.
pub fn upload_bitmap(device: &wgpu::Device, queue: &wgpu::Queue, bitmap: &RgbaImage) -> wgpu::Texture {
    upload_rgba(
        device,
        queue,
        "Palette Source Image",
        bitmap.width(),
        bitmap.height(),
        bitmap.as_raw(),
    )
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::Texture {
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    texture
}
