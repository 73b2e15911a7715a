/// Reflection data extracted from compiled shader bytecode
///
/// A [`ShaderReflector`] turns bytecode into a [`ShaderReflection`]: the flat
/// list of binding descriptors the module declares, plus the compute
/// thread-group size when the module has one. Backends implement the trait;
/// the runtime only consumes the result.

use crate::effect::Result;
use crate::shader::ShaderStage;

/// Scalar element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int32,
    UInt32,
    Float32,
    Float64,
}

/// Type of a uniform-block member
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectedMemberType {
    Scalar(ScalarKind),
    /// (element kind, component count)
    Vector(ScalarKind, u32),
    /// (element kind, rows, columns)
    Matrix(ScalarKind, u32, u32),
    Array {
        element_type: Box<ReflectedMemberType>,
        count: u32,
        stride: Option<u32>,
    },
    Struct(Vec<ReflectedMember>),
}

/// One member of a uniform block
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedMember {
    pub name: String,
    /// Byte offset inside the block
    pub offset: u32,
    /// Byte width
    pub size: u32,
    pub member_type: ReflectedMemberType,
    /// Declared initial value, seeded into the block mirror once
    pub default_value: Option<Vec<u8>>,
}

/// Shape of a uniform block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReflectedBlock {
    /// Total byte size
    pub size: u32,
    pub members: Vec<ReflectedMember>,
}

/// Resource dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDimension {
    Unknown,
    Buffer,
    Texture1D,
    Texture2D,
    Texture2DMultisample,
    Texture3D,
    TextureCube,
}

/// Kind of binding a descriptor occupies
#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    /// Uniform block shared by slot across modules
    UniformBlock(ReflectedBlock),
    /// The module's private "parameters" block
    Parameters(ReflectedBlock),
    /// Read-only resource view
    Resource(ResourceDimension),
    Sampler,
    /// Read-write resource view
    ReadWrite(ResourceDimension),
}

/// One binding descriptor declared by a module
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedBinding {
    pub name: String,
    pub slot: u32,
    pub kind: BindingKind,
}

/// Everything the runtime needs to know about one compiled module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderReflection {
    /// Declared bindings, in no particular order
    pub bindings: Vec<ReflectedBinding>,
    /// Compute thread-group dimensions
    pub thread_group_size: Option<[u32; 3]>,
}

impl ShaderReflection {
    /// Start an empty reflection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a uniform block at `slot`
    pub fn with_uniform_block(mut self, name: &str, slot: u32, block: ReflectedBlock) -> Self {
        self.bindings.push(ReflectedBinding {
            name: name.to_string(),
            slot,
            kind: BindingKind::UniformBlock(block),
        });
        self
    }

    /// Add the private parameters block at `slot`
    pub fn with_parameters(mut self, slot: u32, block: ReflectedBlock) -> Self {
        self.bindings.push(ReflectedBinding {
            name: PARAMETERS_BLOCK_NAME.to_string(),
            slot,
            kind: BindingKind::Parameters(block),
        });
        self
    }

    /// Add a read-only resource at `slot`
    pub fn with_resource(mut self, name: &str, slot: u32, dimension: ResourceDimension) -> Self {
        self.bindings.push(ReflectedBinding {
            name: name.to_string(),
            slot,
            kind: BindingKind::Resource(dimension),
        });
        self
    }

    /// Add a sampler at `slot`
    pub fn with_sampler(mut self, name: &str, slot: u32) -> Self {
        self.bindings.push(ReflectedBinding {
            name: name.to_string(),
            slot,
            kind: BindingKind::Sampler,
        });
        self
    }

    /// Add a read-write resource at `slot`
    pub fn with_read_write(mut self, name: &str, slot: u32, dimension: ResourceDimension) -> Self {
        self.bindings.push(ReflectedBinding {
            name: name.to_string(),
            slot,
            kind: BindingKind::ReadWrite(dimension),
        });
        self
    }

    pub fn with_thread_group_size(mut self, size: [u32; 3]) -> Self {
        self.thread_group_size = Some(size);
        self
    }
}

impl ReflectedBlock {
    /// Block with members laid out back to back as `float` vectors
    ///
    /// Convenience for building reflection tables by hand: every entry is
    /// `(name, component_count)`.
    pub fn packed_floats(members: &[(&str, u32)]) -> Self {
        let mut offset = 0;
        let members = members
            .iter()
            .map(|(name, components)| {
                let size = components * 4;
                let member = ReflectedMember {
                    name: name.to_string(),
                    offset,
                    size,
                    member_type: if *components == 1 {
                        ReflectedMemberType::Scalar(ScalarKind::Float32)
                    } else {
                        ReflectedMemberType::Vector(ScalarKind::Float32, *components)
                    },
                    default_value: None,
                };
                offset += size;
                member
            })
            .collect();
        Self { size: offset, members }
    }
}

/// Name used for the anonymous parameters block
pub const PARAMETERS_BLOCK_NAME: &str = "$Params";

/// Extracts binding descriptors from compiled bytecode
pub trait ShaderReflector {
    fn reflect(&self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderReflection>;
}
