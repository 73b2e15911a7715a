/// Recording device for tests and headless tooling (no GPU required)
///
/// Every call made through [`Device`] or [`DeviceContext`] is appended to a
/// call log as a [`DeviceCall`], so tests can assert on exactly what a pass
/// emitted.

use std::rc::Rc;

use crate::device::{
    BlendState, DepthStencilState, Device, DeviceContext, RasterizerState, ReadWriteView,
    ResourceView, SamplerState, Shader, UniformBuffer,
};
use crate::effect::{Error, Result};
use crate::shader::ShaderStage;

// ============================================================================
// Mock objects
// ============================================================================

#[derive(Debug)]
pub struct MockShader {
    pub name: String,
    pub stage: ShaderStage,
    pub bytecode: Vec<u8>,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct MockBuffer {
    pub name: String,
    pub size: u32,
}

impl UniformBuffer for MockBuffer {
    fn size(&self) -> u32 {
        self.size
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Named stand-in for a caller-owned view or sampler
#[derive(Debug)]
pub struct MockView {
    pub label: String,
}

impl MockView {
    pub fn new(label: &str) -> Rc<Self> {
        Rc::new(Self { label: label.to_string() })
    }
}

impl ResourceView for MockView {
    fn label(&self) -> &str {
        &self.label
    }
}

impl SamplerState for MockView {
    fn label(&self) -> &str {
        &self.label
    }
}

impl ReadWriteView for MockView {
    fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// Call log
// ============================================================================

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateShader {
        name: String,
        stage: ShaderStage,
    },
    CreateUniformBuffer {
        name: String,
        size: u32,
    },
    UpdateUniformBuffer {
        name: String,
        data: Vec<u8>,
    },
    BindShader {
        stage: ShaderStage,
        shader: Option<String>,
    },
    BindUniformBuffers {
        stage: ShaderStage,
        start_slot: u32,
        buffers: Vec<String>,
    },
    BindResources {
        stage: ShaderStage,
        start_slot: u32,
        views: Vec<Option<String>>,
    },
    BindSamplers {
        stage: ShaderStage,
        start_slot: u32,
        samplers: Vec<Option<String>>,
    },
    BindReadWrite {
        stage: ShaderStage,
        slot: u32,
        view: Option<String>,
        initial_count: Option<u32>,
    },
    SetRasterizerState(Option<RasterizerState>),
    SetBlendState {
        state: Option<BlendState>,
        blend_factor: [f32; 4],
        sample_mask: u32,
    },
    SetDepthStencilState {
        state: Option<DepthStencilState>,
        stencil_ref: u32,
    },
    Dispatch(u32, u32, u32),
}

/// Device + context that records instead of rendering
#[derive(Debug, Default)]
pub struct MockDevice {
    calls: Vec<DeviceCall>,
    /// When set, `create_shader` fails with a backend error
    pub fail_shader_creation: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call since creation or the last [`MockDevice::take_calls`]
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Drain the call log
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of logged calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Uniform buffer uploads, in order
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::UpdateUniformBuffer { name, data } => Some((name.clone(), data.clone())),
                _ => None,
            })
            .collect()
    }
}

fn labels<T: ?Sized>(items: &[Option<Rc<T>>], label: impl Fn(&T) -> String) -> Vec<Option<String>> {
    items
        .iter()
        .map(|item| item.as_ref().map(|rc| label(&**rc)))
        .collect()
}

impl Device for MockDevice {
    fn create_shader(&mut self, name: &str, stage: ShaderStage, bytecode: &[u8]) -> Result<Rc<dyn Shader>> {
        if self.fail_shader_creation {
            return Err(Error::BackendError(format!("mock refused shader '{}'", name)));
        }
        self.calls.push(DeviceCall::CreateShader {
            name: name.to_string(),
            stage,
        });
        Ok(Rc::new(MockShader {
            name: name.to_string(),
            stage,
            bytecode: bytecode.to_vec(),
        }))
    }
}

impl DeviceContext for MockDevice {
    fn create_uniform_buffer(&mut self, name: &str, size: u32) -> Result<Rc<dyn UniformBuffer>> {
        self.calls.push(DeviceCall::CreateUniformBuffer {
            name: name.to_string(),
            size,
        });
        Ok(Rc::new(MockBuffer {
            name: name.to_string(),
            size,
        }))
    }

    fn update_uniform_buffer(&mut self, buffer: &dyn UniformBuffer, data: &[u8]) -> Result<()> {
        if data.len() != buffer.size() as usize {
            return Err(Error::BackendError(format!(
                "upload of {} bytes into '{}' of {} bytes",
                data.len(),
                buffer.label(),
                buffer.size()
            )));
        }
        self.calls.push(DeviceCall::UpdateUniformBuffer {
            name: buffer.label().to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn bind_shader(&mut self, stage: ShaderStage, shader: Option<&dyn Shader>) {
        self.calls.push(DeviceCall::BindShader {
            stage,
            shader: shader.map(|s| s.name().to_string()),
        });
    }

    fn bind_uniform_buffers(&mut self, stage: ShaderStage, start_slot: u32, buffers: &[Rc<dyn UniformBuffer>]) {
        self.calls.push(DeviceCall::BindUniformBuffers {
            stage,
            start_slot,
            buffers: buffers.iter().map(|b| b.label().to_string()).collect(),
        });
    }

    fn bind_resources(&mut self, stage: ShaderStage, start_slot: u32, views: &[Option<Rc<dyn ResourceView>>]) {
        self.calls.push(DeviceCall::BindResources {
            stage,
            start_slot,
            views: labels(views, |v| v.label().to_string()),
        });
    }

    fn bind_samplers(&mut self, stage: ShaderStage, start_slot: u32, samplers: &[Option<Rc<dyn SamplerState>>]) {
        self.calls.push(DeviceCall::BindSamplers {
            stage,
            start_slot,
            samplers: labels(samplers, |s| s.label().to_string()),
        });
    }

    fn bind_read_write(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        view: Option<Rc<dyn ReadWriteView>>,
        initial_count: Option<u32>,
    ) {
        self.calls.push(DeviceCall::BindReadWrite {
            stage,
            slot,
            view: view.map(|v| v.label().to_string()),
            initial_count,
        });
    }

    fn set_rasterizer_state(&mut self, state: Option<&RasterizerState>) {
        self.calls.push(DeviceCall::SetRasterizerState(state.copied()));
    }

    fn set_blend_state(&mut self, state: Option<&BlendState>, blend_factor: [f32; 4], sample_mask: u32) {
        self.calls.push(DeviceCall::SetBlendState {
            state: state.cloned(),
            blend_factor,
            sample_mask,
        });
    }

    fn set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32) {
        self.calls.push(DeviceCall::SetDepthStencilState {
            state: state.copied(),
            stencil_ref,
        });
    }

    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.calls.push(DeviceCall::Dispatch(groups_x, groups_y, groups_z));
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
