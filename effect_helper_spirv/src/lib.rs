/*!
# Effect Helper - SPIR-V Backend

SPIR-V implementation of the effect_helper shader toolchain traits.

- [`SpirvReflector`] reflects SPIR-V modules with spirq
- [`GlslCompiler`] compiles GLSL to SPIR-V with naga

Push-constant blocks become the stage's private parameters block; the
`LocalSize` execution mode becomes the compute thread-group size.
*/

mod glsl_compiler;
mod spirv;
mod spirv_reflector;

pub use glsl_compiler::GlslCompiler;
pub use spirv::{is_spirv, local_size, words_from_bytes, words_to_bytes, SPIRV_MAGIC};
pub use spirv_reflector::{SpirvReflector, DEFAULT_PARAMETERS_SLOT};
