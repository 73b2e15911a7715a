//! SPIR-V reflection through spirq
//!
//! Descriptor bindings map onto the runtime's binding kinds by descriptor
//! type; the descriptor binding number is the slot. Push constants become the
//! stage's private parameters block.
//!
//! Storage descriptors declared read-only are plain resources; writable ones
//! are read-write resources.
//!
//! A combined image sampler yields a resource and a sampler at the same slot.
//! Samplers only address slots below [`MAX_SAMPLER_SLOTS`], so a combined
//! image sampler at a higher binding makes the module fail ingestion even
//! though its resource half would fit.

use effect_helper::effect::binding::MAX_SAMPLER_SLOTS;
use effect_helper::effect::shader::{
    BindingKind, ReflectedBinding, ReflectedBlock, ReflectedMember, ReflectedMemberType, ResourceDimension,
    ScalarKind, ShaderReflection, ShaderReflector, ShaderStage, PARAMETERS_BLOCK_NAME,
};
use effect_helper::effect::{Error, Result};
use effect_helper::{effect_bail, effect_trace, effect_warn};
use spirq::spirv::{Dim, ExecutionModel};

use crate::spirv::{local_size, words_from_bytes};

const SOURCE: &str = "effect::spirv";

/// Slot the parameters block binds at unless configured otherwise
pub const DEFAULT_PARAMETERS_SLOT: u32 = 31;

/// [`ShaderReflector`] for SPIR-V bytecode
#[derive(Debug, Clone)]
pub struct SpirvReflector {
    parameters_slot: u32,
}

impl Default for SpirvReflector {
    fn default() -> Self {
        Self {
            parameters_slot: DEFAULT_PARAMETERS_SLOT,
        }
    }
}

impl SpirvReflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind push-constant parameter blocks at `slot`
    pub fn with_parameters_slot(mut self, slot: u32) -> Self {
        self.parameters_slot = slot;
        self
    }

    pub fn parameters_slot(&self) -> u32 {
        self.parameters_slot
    }

    fn binding_for(
        &self,
        name: Option<&String>,
        slot: u32,
        desc_ty: &spirq::ty::DescriptorType,
        ty: &spirq::ty::Type,
    ) -> Result<Vec<ReflectedBinding>> {
        use spirq::ty::{AccessType, DescriptorType};

        let name = name.cloned().unwrap_or_default();
        let binding = |kind| ReflectedBinding {
            name: name.clone(),
            slot,
            kind,
        };
        let bindings = match desc_ty {
            DescriptorType::UniformBuffer() => {
                let block_name = match ty {
                    spirq::ty::Type::Struct(st) => st.name.clone().unwrap_or_else(|| name.clone()),
                    _ => name.clone(),
                };
                vec![ReflectedBinding {
                    name: block_name,
                    slot,
                    kind: BindingKind::UniformBlock(block_from_type(ty)),
                }]
            }
            DescriptorType::SampledImage() | DescriptorType::UniformTexelBuffer() => {
                vec![binding(BindingKind::Resource(dimension_of(ty)))]
            }
            DescriptorType::CombinedImageSampler() => combined_image_sampler(&name, slot, dimension_of(ty)),
            DescriptorType::Sampler() => vec![binding(BindingKind::Sampler)],
            DescriptorType::StorageImage(AccessType::ReadOnly)
            | DescriptorType::StorageTexelBuffer(AccessType::ReadOnly) => {
                vec![binding(BindingKind::Resource(dimension_of(ty)))]
            }
            DescriptorType::StorageImage(..) | DescriptorType::StorageTexelBuffer(..) => {
                vec![binding(BindingKind::ReadWrite(dimension_of(ty)))]
            }
            DescriptorType::StorageBuffer(AccessType::ReadOnly) => {
                vec![binding(BindingKind::Resource(ResourceDimension::Buffer))]
            }
            DescriptorType::StorageBuffer(..) => vec![binding(BindingKind::ReadWrite(ResourceDimension::Buffer))],
            other => {
                effect_bail!(SOURCE, "Unsupported SPIR-V descriptor type for '{}': {:?}", name, other);
            }
        };
        Ok(bindings)
    }
}

/// Resource and sampler halves of a combined image sampler
pub(crate) fn combined_image_sampler(name: &str, slot: u32, dimension: ResourceDimension) -> Vec<ReflectedBinding> {
    if slot >= MAX_SAMPLER_SLOTS {
        effect_warn!(
            SOURCE,
            "Combined image sampler '{}' at binding {} exceeds the sampler limit of {}",
            name,
            slot,
            MAX_SAMPLER_SLOTS
        );
    }
    [BindingKind::Resource(dimension), BindingKind::Sampler]
        .into_iter()
        .map(|kind| ReflectedBinding {
            name: name.to_string(),
            slot,
            kind,
        })
        .collect()
}

fn execution_model(stage: ShaderStage) -> ExecutionModel {
    match stage {
        ShaderStage::Vertex => ExecutionModel::Vertex,
        ShaderStage::Hull => ExecutionModel::TessellationControl,
        ShaderStage::Domain => ExecutionModel::TessellationEvaluation,
        ShaderStage::Geometry => ExecutionModel::Geometry,
        ShaderStage::Pixel => ExecutionModel::Fragment,
        ShaderStage::Compute => ExecutionModel::GLCompute,
    }
}

fn scalar_kind(scalar_ty: &spirq::ty::ScalarType) -> ScalarKind {
    use spirq::ty::ScalarType;
    match scalar_ty {
        ScalarType::Float { bits: 64 } => ScalarKind::Float64,
        ScalarType::Float { .. } => ScalarKind::Float32,
        ScalarType::Integer { is_signed: true, .. } => ScalarKind::Int32,
        ScalarType::Integer { is_signed: false, .. } => ScalarKind::UInt32,
        ScalarType::Boolean => ScalarKind::Bool,
        ScalarType::Void => ScalarKind::Float32,
    }
}

fn member_type(ty: &spirq::ty::Type) -> ReflectedMemberType {
    use spirq::ty::Type;
    match ty {
        Type::Scalar(s) => ReflectedMemberType::Scalar(scalar_kind(s)),
        Type::Vector(v) => ReflectedMemberType::Vector(scalar_kind(&v.scalar_ty), v.nscalar),
        // Column vectors: rows come from the vector width
        Type::Matrix(m) => ReflectedMemberType::Matrix(scalar_kind(&m.vector_ty.scalar_ty), m.vector_ty.nscalar, m.nvector),
        Type::Array(a) => ReflectedMemberType::Array {
            element_type: Box::new(member_type(&a.element_ty)),
            count: a.nelement,
            stride: a.stride.map(|s| s as u32),
        },
        Type::Struct(st) => ReflectedMemberType::Struct(members_of(&st.members)),
        _ => ReflectedMemberType::Scalar(ScalarKind::Float32),
    }
}

fn members_of(members: &[spirq::ty::StructMember]) -> Vec<ReflectedMember> {
    members
        .iter()
        .map(|m| ReflectedMember {
            name: m.name.clone().unwrap_or_default(),
            offset: m.offset.unwrap_or(0) as u32,
            size: m.ty.nbyte().unwrap_or(0) as u32,
            member_type: member_type(&m.ty),
            default_value: None,
        })
        .collect()
}

/// Block shape of a uniform or push-constant struct
fn block_from_type(ty: &spirq::ty::Type) -> ReflectedBlock {
    let members = match ty {
        spirq::ty::Type::Struct(st) => members_of(&st.members),
        _ => Vec::new(),
    };
    let extent = members.iter().map(|m| m.offset + m.size).max().unwrap_or(0);
    let size = ty.nbyte().map_or(extent, |n| (n as u32).max(extent));
    ReflectedBlock { size, members }
}

fn dimension_of(ty: &spirq::ty::Type) -> ResourceDimension {
    use spirq::ty::Type;
    let (dim, multisampled) = match ty {
        Type::SampledImage(img) => (img.dim, img.is_multisampled),
        Type::CombinedImageSampler(combined) => (
            combined.sampled_image_ty.dim,
            combined.sampled_image_ty.is_multisampled,
        ),
        Type::StorageImage(img) => (img.dim, img.is_multisampled),
        _ => return ResourceDimension::Unknown,
    };
    match dim {
        Dim::Dim1D => ResourceDimension::Texture1D,
        Dim::Dim2D | Dim::DimRect if multisampled => ResourceDimension::Texture2DMultisample,
        Dim::Dim2D | Dim::DimRect => ResourceDimension::Texture2D,
        Dim::Dim3D => ResourceDimension::Texture3D,
        Dim::DimCube => ResourceDimension::TextureCube,
        Dim::DimBuffer => ResourceDimension::Buffer,
        _ => ResourceDimension::Unknown,
    }
}

impl ShaderReflector for SpirvReflector {
    fn reflect(&self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderReflection> {
        let words = words_from_bytes(bytecode)?;
        let entry_points = spirq::ReflectConfig::new()
            .spv(words.as_slice())
            .ref_all_rscs(true)
            .reflect()
            .map_err(|e| Error::ReflectionFailed(format!("SPIR-V reflection failed: {:?}", e)))?;

        let model = execution_model(stage);
        let entry_point = entry_points
            .iter()
            .find(|ep| ep.exec_model == model)
            .ok_or_else(|| {
                Error::ReflectionFailed(format!("module has no {} entry point", stage.name()))
            })?;

        let mut reflection = ShaderReflection::new();
        for var in entry_point.vars.iter() {
            match var {
                spirq::var::Variable::Descriptor {
                    name, desc_bind, desc_ty, ty, ..
                } => {
                    if desc_bind.set() != 0 {
                        effect_trace!(
                            SOURCE,
                            "'{}' in descriptor set {} bound by binding number only",
                            name.as_deref().unwrap_or(""),
                            desc_bind.set()
                        );
                    }
                    let bindings = self.binding_for(name.as_ref(), desc_bind.bind(), desc_ty, ty)?;
                    reflection.bindings.extend(bindings);
                }
                spirq::var::Variable::PushConstant { ty, .. } => {
                    reflection.bindings.push(ReflectedBinding {
                        name: PARAMETERS_BLOCK_NAME.to_string(),
                        slot: self.parameters_slot,
                        kind: BindingKind::Parameters(block_from_type(ty)),
                    });
                }
                _ => {}
            }
        }

        if stage == ShaderStage::Compute {
            reflection.thread_group_size = local_size(&words);
        }
        effect_trace!(
            SOURCE,
            "Reflected {} entry point '{}': {} bindings",
            stage.name(),
            entry_point.name,
            reflection.bindings.len()
        );
        Ok(reflection)
    }
}

#[cfg(test)]
#[path = "spirv_reflector_tests.rs"]
mod tests;
