//! The palette engine: palette registry plus the render-and-readback pipeline.

use image::{ImageEncoder, RgbaImage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::blob::BlobStore;
use crate::config::EngineConfig;
use crate::element::ImageElement;
use crate::error::{Error, Result};
use crate::palette::{Palette, PaletteSet};
use crate::render::shader::{TEXTURE_GROUP, UNIFORM_GROUP};
use crate::render::{
    check_fits, create_lookup_sampler, upload_bitmap, upload_lookup_table, GpuContext, LookupTexture,
    PaletteProgram, QuadGeometry, RenderSurface,
};

/// Why a transform left its element untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The element carries no palette annotation.
    NoAnnotation,
    /// The annotation names a palette that was never registered.
    UnknownPalette(String),
    /// The bitmap has a zero dimension.
    EmptyImage,
}

/// Result of [`PaletteEngine::transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The element now points at `src`, a PNG held by the engine.
    Applied { src: String, width: u32, height: u32 },
    Skipped(SkipReason),
}

impl TransformOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransformOutcome::Applied { .. })
    }
}

/// Owns the GPU pipeline, the palette registry and the encoded outputs.
///
/// Construction runs the whole bootstrap (context, program, uniforms,
/// geometry) and either succeeds completely or returns an error.
///
/// Transforms on one engine share a single render surface. Concurrent calls
/// queue on it in the order they first reach it; each call's element is
/// updated only after its own readback has completed.
pub struct PaletteEngine {
    config: EngineConfig,
    context: GpuContext,
    program: PaletteProgram,
    quad: QuadGeometry,
    sampler: wgpu::Sampler,
    palettes: HashMap<String, LookupTexture>,
    surface: Mutex<Option<RenderSurface>>,
    blobs: BlobStore,
}

impl std::fmt::Debug for PaletteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaletteEngine")
            .field("context", &self.context)
            .field("palettes", &self.palettes.len())
            .field("blobs", &self.blobs.len())
            .finish()
    }
}

impl PaletteEngine {
    /// Stand up the GPU pipeline.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let context = GpuContext::acquire(&config)?;
        let program = PaletteProgram::compile(&context)?;
        let quad = QuadGeometry::new(context.device());
        let sampler = create_lookup_sampler(context.device());

        Ok(Self {
            config,
            context,
            program,
            quad,
            sampler,
            palettes: HashMap::new(),
            surface: Mutex::new(None),
            blobs: BlobStore::new(),
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        self.context.adapter_info()
    }

    /// Largest width or height [`Self::transform`] accepts on this device.
    pub fn max_image_dimension(&self) -> u32 {
        self.context.device().limits().max_texture_dimension_2d
    }

    /// Register `rgb_triplets` under `name`, replacing any earlier table.
    pub fn add_palette(&mut self, name: &str, rgb_triplets: &[u8]) -> Result<()> {
        let palette = Palette::from_triplets(name, rgb_triplets, self.config.palette_input)?;
        tracing::debug!("Registering palette \"{}\" ({} colors)", name, palette.len());
        let lut = upload_lookup_table(self.context.device(), self.context.queue(), name, palette);
        self.palettes.insert(name.to_string(), lut);
        Ok(())
    }

    /// Register every entry of `set`, stopping at the first invalid one.
    pub fn register_palettes(&mut self, set: &PaletteSet) -> Result<()> {
        for (name, values) in set.iter() {
            self.add_palette(name, values)?;
        }
        Ok(())
    }

    pub fn has_palette(&self, name: &str) -> bool {
        self.palettes.contains_key(name)
    }

    pub fn palette(&self, name: &str) -> Option<&Palette> {
        self.palettes.get(name).map(LookupTexture::palette)
    }

    /// Registered names, sorted.
    pub fn palette_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.palettes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Encoded PNG bytes behind a locator issued by this engine.
    pub fn blob(&self, url: &str) -> Option<Arc<[u8]>> {
        self.blobs.get(url)
    }

    /// Free the bytes behind `url`. Elements pointing at it keep their bitmap.
    pub fn revoke_object_url(&self, url: &str) -> bool {
        self.blobs.revoke(url)
    }

    /// Remap `element` through the palette it names.
    ///
    /// An element without a registered palette is left as it is and the
    /// call resolves to [`TransformOutcome::Skipped`] after logging a
    /// warning. Otherwise the element's source and bitmap are replaced once
    /// the rendered pixels have been read back and encoded.
    pub async fn transform(&self, element: &mut ImageElement) -> Result<TransformOutcome> {
        let Some(name) = element.palette() else {
            tracing::warn!("Image \"{}\" has no palette annotation", element.src());
            return Ok(TransformOutcome::Skipped(SkipReason::NoAnnotation));
        };
        let Some(lut) = self.palettes.get(name) else {
            tracing::warn!("Palette \"{}\" not registered", name);
            return Ok(TransformOutcome::Skipped(SkipReason::UnknownPalette(name.to_string())));
        };

        let (width, height) = (element.natural_width(), element.natural_height());
        if width == 0 || height == 0 {
            tracing::warn!("Image \"{}\" is empty ({}x{})", element.src(), width, height);
            return Ok(TransformOutcome::Skipped(SkipReason::EmptyImage));
        }

        let started = Instant::now();
        let pixels = self.render(element.bitmap(), lut).await?;
        let rendered = started.elapsed();

        let png = encode_png(&pixels)?;
        let src = self.blobs.create_object_url(png);
        tracing::debug!(
            "Transformed {}x{} image \"{}\" with palette \"{}\" (render {:?}, total {:?})",
            width,
            height,
            element.src(),
            name,
            rendered,
            started.elapsed()
        );

        element.swap_source(src.clone(), pixels);
        Ok(TransformOutcome::Applied { src, width, height })
    }

    /// Draw `bitmap` through `lut` on the shared surface and read it back.
    ///
    /// A failed render discards the surface, so the next call starts from a
    /// freshly allocated target and readback buffer.
    async fn render(&self, bitmap: &RgbaImage, lut: &LookupTexture) -> Result<RgbaImage> {
        let device = self.context.device();
        let (width, height) = bitmap.dimensions();
        check_fits(&device.limits(), width, height)?;

        let mut guard = self.surface.lock().await;
        let result = self.draw(&mut *guard, bitmap, lut).await;
        if result.is_err() && guard.take().is_some() {
            tracing::debug!("Discarded render surface after a failed transform");
        }
        result
    }

    async fn draw(
        &self,
        slot: &mut Option<RenderSurface>,
        bitmap: &RgbaImage,
        lut: &LookupTexture,
    ) -> Result<RgbaImage> {
        let device = self.context.device();
        let queue = self.context.queue();
        let (width, height) = bitmap.dimensions();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let surface = slot.get_or_insert_with(|| RenderSurface::new(device, width, height));
        if surface.resize(device, width, height) {
            tracing::debug!("Resized render surface to {}x{}", width, height);
        }

        let source = upload_bitmap(device, queue, bitmap);
        let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let textures = self
            .program
            .texture_bind_group(device, &source_view, lut.view(), &self.sampler);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Palette Transform Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Palette Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            pass.set_pipeline(self.program.pipeline());
            pass.set_bind_group(UNIFORM_GROUP, self.program.uniform_bind_group(), &[]);
            pass.set_bind_group(TEXTURE_GROUP, &textures, &[]);
            pass.set_vertex_buffer(0, self.quad.buffer().slice(..));
            pass.draw(0..self.quad.vertex_count(), 0..1);
        }
        surface.copy_to_readback(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));

        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::Render(e.to_string()));
        }

        surface
            .read_pixels(device, self.config.readback_timeout())
            .await
    }
}

fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out).write_image(
        pixels.as_raw(),
        pixels.width(),
        pixels.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}
