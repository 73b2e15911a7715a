//! Device abstraction
//!
//! Traits a graphics backend implements, the fixed-function state passes
//! carry, and a recording mock device.

mod device;
pub mod mock_device;
mod state;

pub use device::{Device, DeviceContext, ReadWriteView, ResourceView, SamplerState, Shader, UniformBuffer};
pub use mock_device::{DeviceCall, MockBuffer, MockDevice, MockShader, MockView};
pub use state::{
    BlendFactor, BlendOp, BlendState, ColorWriteMask, CompareOp, CullMode, DepthBias,
    DepthStencilState, FillMode, FrontFace, RasterizerState, RenderTargetBlend,
    StencilFaceState, StencilOp,
};
