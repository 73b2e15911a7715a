/// Effect over one pass with conventionally named variables
///
/// Capabilities are derived from what the pass's modules actually declare:
/// transform matrices, a material block, a diffuse map and a vertex stage
/// each switch on the matching interface.

use std::rc::Rc;

use glam::Mat4;

use crate::binding::Variable;
use crate::capability::{Effect, EffectCapabilities, Material, MaterialEffect, MeshEffect, TransformEffect};
use crate::device::{DeviceContext, ResourceView};
use crate::effect::{Error, Result};
use crate::effect_helper::{EffectHelper, PassKey};
use crate::shader::{ShaderModule, ShaderStage};

pub struct BasicEffect {
    helper: EffectHelper,
    pass: PassKey,
    name: String,
    world: Option<Variable>,
    view: Option<Variable>,
    projection: Option<Variable>,
    material: Option<Variable>,
}

impl BasicEffect {
    pub const WORLD: &'static str = "g_World";
    pub const VIEW: &'static str = "g_View";
    pub const PROJECTION: &'static str = "g_Proj";
    pub const MATERIAL: &'static str = "g_Material";
    pub const DIFFUSE_MAP: &'static str = "g_DiffuseMap";

    /// Wrap pass `pass_name` of `helper`
    pub fn new(helper: EffectHelper, pass_name: &str) -> Result<Self> {
        let pass = helper
            .pass_key(pass_name)
            .ok_or_else(|| Error::InvalidOperation(format!("no pass named '{}'", pass_name)))?;
        Ok(Self {
            world: helper.variable(Self::WORLD),
            view: helper.variable(Self::VIEW),
            projection: helper.variable(Self::PROJECTION),
            material: helper.variable(Self::MATERIAL),
            helper,
            pass,
            name: pass_name.to_string(),
        })
    }

    pub fn helper(&self) -> &EffectHelper {
        &self.helper
    }

    pub fn helper_mut(&mut self) -> &mut EffectHelper {
        &mut self.helper
    }
}

impl Effect for BasicEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> EffectCapabilities {
        let mut caps = EffectCapabilities::empty();
        if self.world.is_some() || self.view.is_some() || self.projection.is_some() {
            caps |= EffectCapabilities::TRANSFORM;
        }
        if self.material.is_some() || self.helper.map_resource_slot(Self::DIFFUSE_MAP).is_some() {
            caps |= EffectCapabilities::MATERIAL;
        }
        if self.vertex_module().is_some() {
            caps |= EffectCapabilities::MESH;
        }
        caps
    }

    fn apply(&mut self, ctx: &mut dyn DeviceContext) -> Result<()> {
        let pass = self
            .helper
            .pass_by_key(self.pass)
            .ok_or_else(|| Error::InvalidOperation(format!("pass '{}' was cleared", self.name)))?;
        pass.apply(ctx)
    }

    fn as_transform(&mut self) -> Option<&mut dyn TransformEffect> {
        if self.capabilities().contains(EffectCapabilities::TRANSFORM) {
            Some(self)
        } else {
            None
        }
    }

    fn as_material(&mut self) -> Option<&mut dyn MaterialEffect> {
        if self.capabilities().contains(EffectCapabilities::MATERIAL) {
            Some(self)
        } else {
            None
        }
    }

    fn as_mesh(&self) -> Option<&dyn MeshEffect> {
        if self.capabilities().contains(EffectCapabilities::MESH) {
            Some(self)
        } else {
            None
        }
    }
}

impl TransformEffect for BasicEffect {
    fn set_world(&mut self, world: &Mat4) {
        if let Some(variable) = &self.world {
            variable.set_mat4(world);
        }
    }

    fn set_view(&mut self, view: &Mat4) {
        if let Some(variable) = &self.view {
            variable.set_mat4(view);
        }
    }

    fn set_projection(&mut self, projection: &Mat4) {
        if let Some(variable) = &self.projection {
            variable.set_mat4(projection);
        }
    }
}

impl MaterialEffect for BasicEffect {
    fn set_material(&mut self, material: &Material) {
        if let Some(variable) = &self.material {
            variable.set_raw(&material.to_bytes());
        }
    }

    fn set_texture(&mut self, texture: Option<&Rc<dyn ResourceView>>) -> Result<()> {
        self.helper.set_resource_by_name(Self::DIFFUSE_MAP, texture)
    }
}

impl MeshEffect for BasicEffect {
    fn vertex_module(&self) -> Option<Rc<ShaderModule>> {
        self.helper
            .pass_by_key(self.pass)?
            .module(ShaderStage::Vertex)
            .cloned()
    }
}
