//! Material shader assembly for the displaced mesh.
//!
//! A [`BaseProgram`] carries `#include <chunk>` markers; [`inject`] splices a
//! [`ShaderPatch`] in after four of them and attaches a [`UniformTable`]
//! holding `time` and `amplitude`. [`ShaderProgram::resolve`] expands every
//! chunk into plain GLSL for the GPU frontend, and [`UniformSynchronizer`]
//! refreshes the uniform values each frame.

mod chunks;
mod error;
mod marker;
mod program;
mod sync;
mod uniforms;

pub use chunks::{ChunkLibrary, CUSTOM_UNIFORMS_CHUNK};
pub use error::InjectionError;
pub use marker::{InjectionMarker, Stage};
pub use program::{
    displaced_standard, inject, BaseProgram, ResolvedProgram, ShaderPatch, ShaderProgram,
    AMPLITUDE_UNIFORM, TIME_UNIFORM,
};
pub use sync::{UniformSynchronizer, DEFAULT_TIME_SCALE};
pub use uniforms::{UniformTable, MATERIAL_BLOCK_INSTANCE, MATERIAL_UNIFORM_GROUP};
