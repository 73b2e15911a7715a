//! Shader stages, reflection, compilation and the module registry types

mod binary_cache;
mod compiler;
pub mod mock_tools;
mod reflection;
mod shader_module;
mod stage;

pub use binary_cache::BinaryCache;
pub use compiler::{CompileRequest, ShaderCompiler, ShaderMacro};
pub use mock_tools::{MockCompiler, MockReflector};
pub use reflection::{
    BindingKind, ReflectedBinding, ReflectedBlock, ReflectedMember, ReflectedMemberType, ResourceDimension,
    ScalarKind, ShaderReflection, ShaderReflector, PARAMETERS_BLOCK_NAME,
};
pub(crate) use shader_module::ModuleLayout;
pub use shader_module::{ParameterLayout, ShaderModule};
pub use stage::{ShaderStage, ShaderStageFlags};
