/// Capability discovery on effect objects
///
/// Renderers hold effects as `dyn Effect` and ask for the interfaces they
/// need: [`Effect::capabilities`] answers cheaply with flags, and the
/// `as_*` methods hand out the matching trait object. No downcasting.

use std::rc::Rc;

use bitflags::bitflags;
use glam::{Mat4, Vec4};

use crate::device::{DeviceContext, ResourceView};
use crate::effect::Result;
use crate::shader::ShaderModule;

bitflags! {
    /// Interfaces an effect implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EffectCapabilities: u32 {
        /// World/view/projection matrices ([`TransformEffect`])
        const TRANSFORM = 1 << 0;
        /// Surface material and texture ([`MaterialEffect`])
        const MATERIAL = 1 << 1;
        /// Vertex input signature ([`MeshEffect`])
        const MESH = 1 << 2;
    }
}

/// Any drawable effect
pub trait Effect {
    fn name(&self) -> &str;

    fn capabilities(&self) -> EffectCapabilities;

    /// Bind the effect's pass
    fn apply(&mut self, ctx: &mut dyn DeviceContext) -> Result<()>;

    fn as_transform(&mut self) -> Option<&mut dyn TransformEffect> {
        None
    }

    fn as_material(&mut self) -> Option<&mut dyn MaterialEffect> {
        None
    }

    fn as_mesh(&self) -> Option<&dyn MeshEffect> {
        None
    }
}

/// Effects positioned by world, view and projection matrices
pub trait TransformEffect {
    fn set_world(&mut self, world: &Mat4);
    fn set_view(&mut self, view: &Mat4);
    fn set_projection(&mut self, projection: &Mat4);
}

/// Classic lit-surface material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    /// `w` holds the specular power
    pub specular: Vec4,
    pub reflect: Vec4,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::ONE,
            specular: Vec4::new(0.0, 0.0, 0.0, 16.0),
            reflect: Vec4::ZERO,
        }
    }
}

impl Material {
    /// Packed as four consecutive `float4`
    pub fn to_bytes(&self) -> Vec<u8> {
        [self.ambient, self.diffuse, self.specular, self.reflect]
            .iter()
            .flat_map(|v| bytemuck::bytes_of(v).to_vec())
            .collect()
    }
}

/// Effects with a surface material and diffuse texture
pub trait MaterialEffect {
    fn set_material(&mut self, material: &Material);

    /// Held weakly, like every caller-supplied view
    fn set_texture(&mut self, texture: Option<&Rc<dyn ResourceView>>) -> Result<()>;
}

/// Effects that draw meshes through a vertex stage
pub trait MeshEffect {
    /// Vertex module whose input signature mesh layouts must match
    fn vertex_module(&self) -> Option<Rc<ShaderModule>>;
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
