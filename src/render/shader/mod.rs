//! The fixed palette-remap shader program and its geometry.

mod program;
mod quad;

pub use program::{
    PaletteProgram, FLIP_Y, IMAGE_BINDING, PALETTE_BINDING, POSITION_LOCATION, SAMPLER_BINDING,
    TARGET_FORMAT, TEXTURE_GROUP, UNIFORM_GROUP,
};
pub use quad::{QuadGeometry, QuadVertex, FULL_SCREEN_QUAD};
