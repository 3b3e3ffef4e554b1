//! Full-screen quad geometry.

use wgpu::util::DeviceExt;


/// Vertex format: a clip-space position, nothing else.
///
/// UVs are derived from the position in the vertex shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

/// Two triangles covering the clip-space square.
pub const FULL_SCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
];

impl QuadVertex {
    /// The `position` attribute fed to shader input `location`.
    pub fn position_attribute(location: u32) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: location,
            format: wgpu::VertexFormat::Float32x2,
        }
    }

    /// Vertex buffer layout for wgpu: 2 tightly packed f32s, no stride padding.
    pub fn desc(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Static vertex buffer holding [`FULL_SCREEN_QUAD`].
pub struct QuadGeometry {
    buffer: wgpu::Buffer,
}

impl std::fmt::Debug for QuadGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadGeometry")
            .field("vertex_count", &self.vertex_count())
            .finish()
    }
}

impl QuadGeometry {
    /// Upload the quad. The program's pipeline fixes the attribute layout.
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Palette Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&FULL_SCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        FULL_SCREEN_QUAD.len() as u32
    }
}
