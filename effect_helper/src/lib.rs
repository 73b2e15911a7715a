/*!
# Effect Helper

Shader-binding runtime: reflection-driven resource tables for arbitrary
shader pipelines.

Compiled shader modules are reflected once when they are added. Their uniform
blocks, resources, samplers and read-write resources land in a name-indexed
symbol table and in slot tables shared by every pass, so a renderer drives
any pipeline through a handful of calls instead of per-shader binding code.

## Architecture

- **EffectHelper**: the runtime; owns modules, passes, symbols and tables
- **Pass**: up to one module per stage plus fixed-function state; `apply()`
  binds with one device call per run of contiguous slots
- **Variable**: dirty-tracked view into a uniform block
- **Device / DeviceContext**: traits a graphics backend implements
- **ShaderReflector / ShaderCompiler**: traits a shader toolchain implements

Backends (see the `effect_helper_spirv` crate) provide concrete reflectors,
compilers and devices.
*/

// Internal modules
mod basic_effect;
mod binding;
mod capability;
mod config;
mod device;
mod effect_helper;
mod error;
pub mod log;
mod pass;
mod shader;

// Main effect namespace module
pub mod effect {
    // Error types
    pub use crate::error::{Error, Result};

    // Runtime
    pub use crate::config::{BlockSizePolicy, EffectConfig};
    pub use crate::effect_helper::{EffectHelper, PassKey};

    // Capability discovery
    pub use crate::basic_effect::BasicEffect;
    pub use crate::capability::{Effect, EffectCapabilities, Material, MaterialEffect, MeshEffect, TransformEffect};

    // Logging sub-module (types and sink control; effect_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Binding primitives
    pub mod binding {
        pub use crate::binding::{
            set_bits, words_to_mask, BitRuns, NameInsertError, NameKey, NameTable, ReadWriteSlot, ResourceSlot,
            SamplerSlot, SharedTables, SlotKind, SlotRun, StageBindingRecord, SymbolTable, UniformBlock, Variable,
            VariableEntry, MAX_READ_WRITE_SLOTS, MAX_RESOURCE_SLOTS, MAX_SAMPLER_SLOTS, MAX_UNIFORM_BLOCK_SLOTS,
        };
    }

    // Device traits and fixed-function state
    pub mod device {
        pub use crate::device::{
            BlendFactor, BlendOp, BlendState, ColorWriteMask, CompareOp, CullMode, DepthBias, DepthStencilState,
            Device, DeviceContext, FillMode, FrontFace, RasterizerState, ReadWriteView, RenderTargetBlend,
            ResourceView, SamplerState, Shader, StencilFaceState, StencilOp, UniformBuffer,
        };
    }

    // Shader stages, reflection and compilation
    pub mod shader {
        pub use crate::shader::{
            BinaryCache, BindingKind, CompileRequest, ParameterLayout, ReflectedBinding, ReflectedBlock,
            ReflectedMember, ReflectedMemberType, ResourceDimension, ScalarKind, ShaderCompiler, ShaderMacro,
            ShaderModule, ShaderReflection, ShaderReflector, ShaderStage, ShaderStageFlags, PARAMETERS_BLOCK_NAME,
        };
    }

    // Passes
    pub mod pass {
        pub use crate::pass::{Pass, PassDesc};
    }

    // Test doubles (no GPU or shader toolchain required)
    pub mod mock {
        pub use crate::device::{DeviceCall, MockBuffer, MockDevice, MockShader, MockView};
        pub use crate::shader::{MockCompiler, MockReflector};
    }
}

// Re-export math library at crate root
pub use glam;
