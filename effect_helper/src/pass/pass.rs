/// Passes: per-stage shader modules plus fixed-function state
///
/// [`Pass::apply`] binds everything the pass's modules declared with as few
/// device calls as possible: contiguous slots are bound with one call per run
/// of set bits in each stage's usage masks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::binding::{set_bits, SharedTables, UniformBlock, Variable};
use crate::device::{BlendState, DepthStencilState, DeviceContext, RasterizerState, ReadWriteView, ResourceView, SamplerState};
use crate::effect::{Error, Result};
use crate::shader::{ShaderModule, ShaderStage, ShaderStageFlags, PARAMETERS_BLOCK_NAME};
use crate::{effect_error, effect_trace};

const SOURCE: &str = "effect::Pass";

// ===== DESCRIPTOR =====

/// Names of the shader modules making up a pass, one per stage at most
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassDesc {
    pub name: String,
    pub shaders: [Option<String>; ShaderStage::COUNT],
}

impl PassDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shaders: Default::default(),
        }
    }

    /// Use module `shader` for `stage`
    pub fn with_shader(mut self, stage: ShaderStage, shader: &str) -> Self {
        self.shaders[stage.index()] = Some(shader.to_string());
        self
    }

    pub fn vertex(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Vertex, shader)
    }

    pub fn hull(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Hull, shader)
    }

    pub fn domain(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Domain, shader)
    }

    pub fn geometry(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Geometry, shader)
    }

    pub fn pixel(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Pixel, shader)
    }

    pub fn compute(self, shader: &str) -> Self {
        self.with_shader(ShaderStage::Compute, shader)
    }

    /// (stage, module name) pairs in binding order
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| self.shaders[stage.index()].as_deref().map(|name| (stage, name)))
    }
}

// ===== PASS =====

struct PassStage {
    module: Rc<ShaderModule>,
    /// This pass's own copy of the module's parameters block
    parameters: Option<Rc<RefCell<UniformBlock>>>,
}

pub struct Pass {
    name: String,
    stages: [Option<PassStage>; ShaderStage::COUNT],
    tables: Rc<RefCell<SharedTables>>,
    rasterizer: Option<RasterizerState>,
    blend: Option<BlendState>,
    blend_factor: [f32; 4],
    sample_mask: u32,
    depth_stencil: Option<DepthStencilState>,
    stencil_ref: u32,
}

impl Pass {
    /// Assemble a pass from resolved modules (internal use by EffectHelper)
    pub(crate) fn new(
        name: &str,
        modules: [Option<Rc<ShaderModule>>; ShaderStage::COUNT],
        tables: Rc<RefCell<SharedTables>>,
    ) -> Self {
        let stages = modules.map(|module| {
            module.map(|module| {
                let parameters = module.parameters().map(|layout| {
                    let block_name = format!("{}.{}", module.name(), PARAMETERS_BLOCK_NAME);
                    Rc::new(RefCell::new(layout.instantiate(&block_name)))
                });
                PassStage { module, parameters }
            })
        });
        Self {
            name: name.to_string(),
            stages,
            tables,
            rasterizer: None,
            blend: None,
            blend_factor: [1.0; 4],
            sample_mask: u32::MAX,
            depth_stencil: None,
            stencil_ref: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module bound to `stage`
    pub fn module(&self, stage: ShaderStage) -> Option<&Rc<ShaderModule>> {
        self.stages[stage.index()].as_ref().map(|s| &s.module)
    }

    /// Stages that have a module
    pub fn active_stages(&self) -> ShaderStageFlags {
        ShaderStage::ALL
            .into_iter()
            .filter(|stage| self.stages[stage.index()].is_some())
            .fold(ShaderStageFlags::empty(), |acc, stage| acc | stage.flag())
    }

    /// Thread-group size of the compute module
    pub fn thread_group_size(&self) -> Option<[u32; 3]> {
        self.module(ShaderStage::Compute)
            .and_then(|module| module.thread_group_size())
    }

    // ===== FIXED-FUNCTION STATE =====

    /// `None` restores the device default
    pub fn set_rasterizer_state(&mut self, state: Option<RasterizerState>) {
        self.rasterizer = state;
    }

    pub fn set_blend_state(&mut self, state: Option<BlendState>, blend_factor: [f32; 4], sample_mask: u32) {
        self.blend = state;
        self.blend_factor = blend_factor;
        self.sample_mask = sample_mask;
    }

    pub fn set_depth_stencil_state(&mut self, state: Option<DepthStencilState>, stencil_ref: u32) {
        self.depth_stencil = state;
        self.stencil_ref = stencil_ref;
    }

    pub fn rasterizer_state(&self) -> Option<&RasterizerState> {
        self.rasterizer.as_ref()
    }

    pub fn blend_state(&self) -> Option<&BlendState> {
        self.blend.as_ref()
    }

    pub fn depth_stencil_state(&self) -> Option<&DepthStencilState> {
        self.depth_stencil.as_ref()
    }

    // ===== PARAMETERS =====

    /// Handle to a parameter of the module bound to `stage`
    ///
    /// The handle writes into this pass's own parameters block only.
    pub fn param(&self, stage: ShaderStage, name: &str) -> Option<Variable> {
        let pass_stage = self.stages[stage.index()].as_ref()?;
        let block = pass_stage.parameters.as_ref()?;
        let (offset, size) = pass_stage.module.parameters()?.member(name)?;
        Some(Variable::new(block.clone(), name, offset, size))
    }

    // ===== APPLY =====

    /// Bind shaders, uniform blocks, resources and state on `ctx`
    ///
    /// Stages run in pipeline order; stages without a module are unbound.
    /// Dirty uniform blocks are uploaded before they are bound.
    pub fn apply(&self, ctx: &mut dyn DeviceContext) -> Result<()> {
        let tables = self.tables.borrow();
        for stage in ShaderStage::ALL {
            match &self.stages[stage.index()] {
                None => ctx.bind_shader(stage, None),
                Some(pass_stage) => {
                    ctx.bind_shader(stage, Some(pass_stage.module.shader().as_ref()));
                    self.bind_stage(ctx, &tables, stage, pass_stage)
                        .map_err(|e| self.report(e))?;
                }
            }
        }

        ctx.set_rasterizer_state(self.rasterizer.as_ref());
        ctx.set_blend_state(self.blend.as_ref(), self.blend_factor, self.sample_mask);
        ctx.set_depth_stencil_state(self.depth_stencil.as_ref(), self.stencil_ref);
        effect_trace!(SOURCE, "Applied pass '{}'", self.name);
        Ok(())
    }

    fn bind_stage(
        &self,
        ctx: &mut dyn DeviceContext,
        tables: &SharedTables,
        stage: ShaderStage,
        pass_stage: &PassStage,
    ) -> Result<()> {
        let record = pass_stage.module.record();

        for run in record.uniform_block_runs() {
            let mut buffers = Vec::with_capacity(run.count as usize);
            for slot in run.slots() {
                let block = tables
                    .uniform_block(slot)
                    .ok_or_else(|| missing_slot(stage, "uniform block", slot))?;
                buffers.push(block.borrow_mut().upload(ctx)?);
            }
            ctx.bind_uniform_buffers(stage, run.start, &buffers);
        }

        if let Some(parameters) = &pass_stage.parameters {
            let mut parameters = parameters.borrow_mut();
            let buffer = parameters.upload(ctx)?;
            ctx.bind_uniform_buffers(stage, parameters.slot(), &[buffer]);
        }

        for run in record.sampler_runs() {
            let samplers = run
                .slots()
                .map(|slot| {
                    tables
                        .sampler(slot)
                        .map(|s| s.sampler())
                        .ok_or_else(|| missing_slot(stage, "sampler", slot))
                })
                .collect::<Result<Vec<Option<Rc<dyn SamplerState>>>>>()?;
            ctx.bind_samplers(stage, run.start, &samplers);
        }

        for run in record.resource_runs() {
            let views = run
                .slots()
                .map(|slot| {
                    tables
                        .resource(slot)
                        .map(|r| r.view())
                        .ok_or_else(|| missing_slot(stage, "resource", slot))
                })
                .collect::<Result<Vec<Option<Rc<dyn ResourceView>>>>>()?;
            ctx.bind_resources(stage, run.start, &views);
        }

        if stage.supports_read_write() {
            for slot in set_bits(record.read_write_mask()) {
                let entry = tables
                    .read_write(slot)
                    .ok_or_else(|| missing_slot(stage, "read-write resource", slot))?;
                let view: Option<Rc<dyn ReadWriteView>> = entry.view();
                ctx.bind_read_write(stage, slot, view, entry.take_initial_count());
            }
        }
        Ok(())
    }

    /// Launch enough thread groups to cover `x * y * z` work items
    ///
    /// Counts are divided by the compute module's thread-group size, rounding
    /// up. Call [`Pass::apply`] first.
    pub fn dispatch(&self, ctx: &mut dyn DeviceContext, x: u32, y: u32, z: u32) -> Result<()> {
        if self.module(ShaderStage::Compute).is_none() {
            return Err(self.report(Error::InvalidOperation(format!(
                "dispatch on pass '{}' which has no compute shader",
                self.name
            ))));
        }
        let [gx, gy, gz] = self.thread_group_size().unwrap_or([1, 1, 1]);
        ctx.dispatch(x.div_ceil(gx.max(1)), y.div_ceil(gy.max(1)), z.div_ceil(gz.max(1)));
        Ok(())
    }

    fn report(&self, err: Error) -> Error {
        effect_error!(SOURCE, "Pass '{}': {}", self.name, err);
        err
    }
}

fn missing_slot(stage: ShaderStage, what: &str, slot: u32) -> Error {
    Error::InvalidOperation(format!(
        "{} uses {} slot {} which is not in the shared tables",
        stage.name(),
        what,
        slot
    ))
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<(&str, &str)> = ShaderStage::ALL
            .iter()
            .filter_map(|stage| self.module(*stage).map(|m| (stage.name(), m.name())))
            .collect();
        f.debug_struct("Pass")
            .field("name", &self.name)
            .field("stages", &self.active_stages())
            .field("modules", &modules)
            .finish()
    }
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
