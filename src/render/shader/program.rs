//! Shader program: compiled module, linked render pipeline and static uniforms.
//!
//! Texture "units" are bind group slots: the source image sits in slot
//! [`IMAGE_BINDING`] and the palette lookup table in [`PALETTE_BINDING`] of
//! [`TEXTURE_GROUP`]. The flip uniform lives alone in [`UNIFORM_GROUP`].

use wgpu::util::DeviceExt;

use super::quad::QuadVertex;
use crate::error::{Error, Result};
use crate::render::context::GpuContext;

/// Bind group of the static uniform buffer.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group of the per-transform textures.
pub const TEXTURE_GROUP: u32 = 1;
/// Source image, texture unit 0.
pub const IMAGE_BINDING: u32 = 0;
/// Palette lookup table, texture unit 1.
pub const PALETTE_BINDING: u32 = 1;
/// Shared nearest/clamp sampler.
pub const SAMPLER_BINDING: u32 = 2;
/// Binding of the flip uniform inside [`UNIFORM_GROUP`].
const FLIP_BINDING: u32 = 0;
/// Vertex input location of `position`.
pub const POSITION_LOCATION: u32 = 0;

/// Vertical flip applied in the vertex shader for offscreen rendering.
pub const FLIP_Y: f32 = -1.0;

/// Format of the offscreen render target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const SHADER_SOURCE: &str = include_str!("palette.wgsl");

/// Uniform buffer data for the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    flip_y: f32,
    _pad: [f32; 3],
}

/// Compiled, linked and uniform-bound palette program.
pub struct PaletteProgram {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
    /// Kept alive for the bind group.
    _uniform_buffer: wgpu::Buffer,
}

impl std::fmt::Debug for PaletteProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaletteProgram")
            .field("target_format", &TARGET_FORMAT)
            .field("flip_y", &FLIP_Y)
            .finish()
    }
}

impl PaletteProgram {
    /// Compile the shader, link the pipeline, then bind the static uniforms.
    pub fn compile(ctx: &GpuContext) -> Result<Self> {
        let device = ctx.device();

        let module = compile_module(device)?;

        let flip = binding_slot("flip")?;
        let image = binding_slot("image")?;
        let palette = binding_slot("palette")?;
        let position = binding_slot("position")?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let uniform_layout = create_uniform_layout(device, flip);
        let texture_layout = create_texture_layout(device, image, palette);
        let pipeline =
            create_pipeline(device, &module, &uniform_layout, &texture_layout, position);
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(Error::ProgramLink { log: e.to_string() });
        }

        let (uniform_buffer, uniform_bind_group) = bind_uniforms(device, &uniform_layout, flip);

        Ok(Self {
            pipeline,
            texture_layout,
            uniform_bind_group,
            _uniform_buffer: uniform_buffer,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn uniform_bind_group(&self) -> &wgpu::BindGroup {
        &self.uniform_bind_group
    }

    /// Bind a source image and a palette to their texture units.
    pub fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        image: &wgpu::TextureView,
        palette: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Palette Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: IMAGE_BINDING,
                    resource: wgpu::BindingResource::TextureView(image),
                },
                wgpu::BindGroupEntry {
                    binding: PALETTE_BINDING,
                    resource: wgpu::BindingResource::TextureView(palette),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

/// Resolve a program input by name.
///
/// `"image"` and `"palette"` are texture units, `"flip"` the uniform
/// binding and `"position"` the vertex location.
fn binding_slot(name: &str) -> Result<u32> {
    match name {
        "image" => Ok(IMAGE_BINDING),
        "palette" => Ok(PALETTE_BINDING),
        "flip" => Ok(FLIP_BINDING),
        "position" => Ok(POSITION_LOCATION),
        other => Err(Error::UnknownBinding(other.to_string())),
    }
}

/// Compile the WGSL module, collecting compiler diagnostics on failure.
fn compile_module(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Palette Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
    });
    let info = pollster::block_on(module.get_compilation_info());
    let scope_error = pollster::block_on(device.pop_error_scope());

    let mut log = compilation_log(&info);
    if let Some(e) = scope_error {
        if log.is_empty() {
            log = e.to_string();
        }
    }
    if !log.is_empty() {
        return Err(Error::ShaderCompile { log });
    }
    Ok(module)
}

/// Error-severity compiler messages, one per line.
fn compilation_log(info: &wgpu::CompilationInfo) -> String {
    info.messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
            None => m.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn create_uniform_layout(device: &wgpu::Device, flip: u32) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Palette Uniform Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: flip,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_texture_layout(
    device: &wgpu::Device,
    image: u32,
    palette: u32,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Palette Texture Bind Group Layout"),
        entries: &[
            texture_entry(image),
            texture_entry(palette),
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    uniform_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    position: u32,
) -> wgpu::RenderPipeline {
    let attributes = [QuadVertex::position_attribute(position)];
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Palette Pipeline Layout"),
        bind_group_layouts: &[uniform_layout, texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Palette Render Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[QuadVertex::desc(&attributes)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // The flip reverses winding; both triangles must survive.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Create the flip uniform buffer and bind it once.
fn bind_uniforms(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    flip: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let uniforms = Uniforms { flip_y: FLIP_Y, _pad: [0.0; 3] };
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Palette Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniforms]),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Palette Uniform Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: flip,
            resource: buffer.as_entire_binding(),
        }],
    });

    (buffer, bind_group)
}
