//! GPU side of the palette filter: device, program, textures, render target.

pub mod context;
pub mod shader;
pub mod surface;
pub mod texture;

pub use context::GpuContext;
pub use shader::{PaletteProgram, QuadGeometry};
pub use surface::{check_fits, RenderSurface};
pub use texture::{create_lookup_sampler, upload_bitmap, upload_lookup_table, LookupTexture};
