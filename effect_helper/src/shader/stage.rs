/// Shader stages and stage visibility flags

use bitflags::bitflags;

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    /// Tessellation control
    Hull,
    /// Tessellation evaluation
    Domain,
    Geometry,
    /// Fragment
    Pixel,
    Compute,
}

impl ShaderStage {
    /// Number of stages
    pub const COUNT: usize = 6;

    /// All stages, in the order passes bind them
    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
        ShaderStage::Compute,
    ];

    /// Position in [`ShaderStage::ALL`]
    pub fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Hull => 1,
            ShaderStage::Domain => 2,
            ShaderStage::Geometry => 3,
            ShaderStage::Pixel => 4,
            ShaderStage::Compute => 5,
        }
    }

    /// Whether the stage can bind read-write resources
    pub fn supports_read_write(self) -> bool {
        matches!(self, ShaderStage::Pixel | ShaderStage::Compute)
    }

    /// Short name used in logs
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::Hull => "HS",
            ShaderStage::Domain => "DS",
            ShaderStage::Geometry => "GS",
            ShaderStage::Pixel => "PS",
            ShaderStage::Compute => "CS",
        }
    }

    pub fn flag(self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Hull => ShaderStageFlags::HULL,
            ShaderStage::Domain => ShaderStageFlags::DOMAIN,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::Pixel => ShaderStageFlags::PIXEL,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

bitflags! {
    /// Set of shader stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const HULL = 1 << 1;
        const DOMAIN = 1 << 2;
        const GEOMETRY = 1 << 3;
        const PIXEL = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}
