/// Device and device-context traits consumed by the runtime
///
/// The runtime never talks to a graphics API directly. A backend implements
/// [`Device`] (object creation at load time) and [`DeviceContext`] (binding
/// and upload calls issued by [`Pass::apply`](crate::pass::Pass::apply)).
///
/// Handles are reference counted with `Rc`: the runtime is single-threaded
/// and caller-supplied views are only ever held through `Weak`.

use std::rc::Rc;

use crate::device::{BlendState, DepthStencilState, RasterizerState};
use crate::effect::Result;
use crate::shader::ShaderStage;

/// Device shader object for one stage
pub trait Shader {
    fn stage(&self) -> ShaderStage;

    /// Logical name the shader was created under
    fn name(&self) -> &str;
}

/// GPU-side storage of one uniform block
pub trait UniformBuffer {
    /// Size in bytes
    fn size(&self) -> u32;

    fn label(&self) -> &str {
        ""
    }
}

/// Read-only resource view supplied by the caller
pub trait ResourceView {
    fn label(&self) -> &str {
        ""
    }
}

/// Sampler state supplied by the caller
pub trait SamplerState {
    fn label(&self) -> &str {
        ""
    }
}

/// Read-write resource view supplied by the caller
pub trait ReadWriteView {
    fn label(&self) -> &str {
        ""
    }
}

/// Factory for shader objects
pub trait Device {
    /// Create the device object for compiled bytecode
    fn create_shader(&mut self, name: &str, stage: ShaderStage, bytecode: &[u8]) -> Result<Rc<dyn Shader>>;
}

/// Command interface used while applying passes
pub trait DeviceContext {
    /// Create the GPU buffer backing a uniform block
    fn create_uniform_buffer(&mut self, name: &str, size: u32) -> Result<Rc<dyn UniformBuffer>>;

    /// Replace the whole content of a uniform buffer
    fn update_uniform_buffer(&mut self, buffer: &dyn UniformBuffer, data: &[u8]) -> Result<()>;

    /// Bind a stage's shader, or unbind the stage with `None`
    fn bind_shader(&mut self, stage: ShaderStage, shader: Option<&dyn Shader>);

    /// Bind `buffers` to consecutive slots starting at `start_slot`
    fn bind_uniform_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Rc<dyn UniformBuffer>]);

    /// Bind `views` to consecutive slots starting at `start_slot`
    fn bind_resources(&mut self, stage: ShaderStage, start_slot: u32, views: &[Option<Rc<dyn ResourceView>>]);

    /// Bind `samplers` to consecutive slots starting at `start_slot`
    fn bind_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<Rc<dyn SamplerState>>]);

    /// Bind one read-write view
    ///
    /// `initial_count` resets the view's hidden counter; `None` keeps it.
    fn bind_read_write(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        view: Option<Rc<dyn ReadWriteView>>,
        initial_count: Option<u32>,
    );

    fn set_rasterizer_state(&mut self, state: Option<&RasterizerState>);

    fn set_blend_state(&mut self, state: Option<&BlendState>, blend_factor: [f32; 4], sample_mask: u32);

    fn set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32);

    /// Launch compute thread groups
    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32);
}
