/// Shader modules and reflection ingestion
///
/// Ingestion runs in two phases. [`ModuleLayout::plan`] validates every
/// reflected binding against the runtime's symbol table and shared tables
/// (and against the module's own other bindings) without touching them.
/// [`ModuleLayout::commit`] then registers the module. A rejected module
/// therefore leaves no trace.

use std::fmt;
use std::rc::Rc;

use crate::binding::{
    NameInsertError, NameTable, SharedTables, SlotKind, StageBindingRecord, SymbolTable, UniformBlock,
    VariableEntry, MAX_READ_WRITE_SLOTS, MAX_RESOURCE_SLOTS, MAX_SAMPLER_SLOTS, MAX_UNIFORM_BLOCK_SLOTS,
};
use crate::config::BlockSizePolicy;
use crate::device::Shader;
use crate::effect::{Error, Result};
use crate::shader::{BindingKind, ReflectedBlock, ResourceDimension, ShaderReflection, ShaderStage};
use crate::{effect_debug, effect_warn};

const SOURCE: &str = "effect::ShaderModule";

// ===== PARAMETER LAYOUT =====

/// Layout of a module's private parameters block
///
/// Passes instantiate their own block from it, so two passes built from the
/// same module never share parameter values.
#[derive(Debug, Clone)]
pub struct ParameterLayout {
    slot: u32,
    size: u32,
    /// name -> (offset, size)
    members: NameTable<(u32, u32)>,
    defaults: Vec<(u32, Vec<u8>)>,
}

impl ParameterLayout {
    fn from_block(module: &str, slot: u32, block: &ReflectedBlock) -> Result<Self> {
        let mut members = NameTable::new();
        let mut defaults = Vec::new();
        for member in &block.members {
            members
                .insert(&member.name, (member.offset, member.size))
                .map_err(|e| match e {
                    NameInsertError::Occupied => Error::BindingMismatch(format!(
                        "module '{}' declares parameter '{}' twice",
                        module, member.name
                    )),
                    NameInsertError::Collision { existing } => Error::NameCollision {
                        existing,
                        incoming: member.name.clone(),
                    },
                })?;
            if let Some(value) = &member.default_value {
                defaults.push((member.offset, value.clone()));
            }
        }
        Ok(Self {
            slot,
            size: block.size,
            members,
            defaults,
        })
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// (offset, size) of a parameter
    pub fn member(&self, name: &str) -> Option<(u32, u32)> {
        self.members.get(name).copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Fresh block holding the declared defaults
    pub fn instantiate(&self, block_name: &str) -> UniformBlock {
        let mut block = UniformBlock::new(block_name, self.slot, self.size);
        for (offset, value) in &self.defaults {
            block.write(*offset, value);
        }
        block
    }
}

// ===== SHADER MODULE =====

/// One compiled shader registered with the runtime
pub struct ShaderModule {
    name: String,
    stage: ShaderStage,
    shader: Rc<dyn Shader>,
    record: StageBindingRecord,
    parameters: Option<ParameterLayout>,
    thread_group_size: Option<[u32; 3]>,
}

impl ShaderModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Device shader object
    pub fn shader(&self) -> &Rc<dyn Shader> {
        &self.shader
    }

    pub fn record(&self) -> &StageBindingRecord {
        &self.record
    }

    pub fn parameters(&self) -> Option<&ParameterLayout> {
        self.parameters.as_ref()
    }

    /// Compute thread-group dimensions
    pub fn thread_group_size(&self) -> Option<[u32; 3]> {
        self.thread_group_size
    }
}

impl fmt::Debug for ShaderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderModule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("record", &self.record)
            .field("parameters", &self.parameters)
            .field("thread_group_size", &self.thread_group_size)
            .finish()
    }
}

// ===== INGESTION =====

struct StagedBlock {
    name: String,
    slot: u32,
    size: u32,
    /// (member, offset, bytes)
    defaults: Vec<(String, u32, Vec<u8>)>,
}

/// Validated, not yet registered result of reflecting one module
pub(crate) struct ModuleLayout {
    stage: ShaderStage,
    record: StageBindingRecord,
    parameters: Option<ParameterLayout>,
    thread_group_size: Option<[u32; 3]>,
    symbols: SymbolTable,
    blocks: Vec<StagedBlock>,
    resources: Vec<(String, u32, ResourceDimension)>,
    samplers: Vec<(String, u32)>,
    read_write: Vec<(String, u32, ResourceDimension)>,
}

fn check_slot_range(module: &str, what: &str, name: &str, slot: u32, max: u32) -> Result<()> {
    if slot >= max {
        return Err(Error::BindingMismatch(format!(
            "module '{}' binds {} '{}' at slot {} (limit {})",
            module, what, name, slot, max
        )));
    }
    Ok(())
}

/// Dimensions agree unless both are known and differ
fn dimensions_agree(a: ResourceDimension, b: ResourceDimension) -> bool {
    a == b || a == ResourceDimension::Unknown || b == ResourceDimension::Unknown
}

impl ModuleLayout {
    /// Validate `reflection` without registering anything
    pub(crate) fn plan(
        module: &str,
        stage: ShaderStage,
        reflection: &ShaderReflection,
        symbols: &SymbolTable,
        tables: &SharedTables,
        policy: BlockSizePolicy,
    ) -> Result<Self> {
        let mut layout = ModuleLayout {
            stage,
            record: StageBindingRecord::new(stage),
            parameters: None,
            thread_group_size: reflection.thread_group_size,
            symbols: SymbolTable::new(),
            blocks: Vec::new(),
            resources: Vec::new(),
            samplers: Vec::new(),
            read_write: Vec::new(),
        };

        for binding in &reflection.bindings {
            let name = binding.name.as_str();
            let slot = binding.slot;
            match &binding.kind {
                BindingKind::UniformBlock(block) => {
                    layout.plan_uniform_block(module, name, slot, block, symbols, tables, policy)?;
                }
                BindingKind::Parameters(block) => {
                    if block.members.is_empty() {
                        continue;
                    }
                    check_slot_range(module, "parameters block", name, slot, MAX_UNIFORM_BLOCK_SLOTS)?;
                    if layout.parameters.is_some() {
                        return Err(Error::BindingMismatch(format!(
                            "module '{}' declares more than one parameters block",
                            module
                        )));
                    }
                    layout.parameters = Some(ParameterLayout::from_block(module, slot, block)?);
                }
                BindingKind::Resource(dimension) => {
                    check_slot_range(module, "resource", name, slot, MAX_RESOURCE_SLOTS)?;
                    let existing = tables
                        .resource(slot)
                        .map(|r| r.dimension)
                        .into_iter()
                        .chain(layout.resources.iter().filter(|r| r.1 == slot).map(|r| r.2));
                    for other in existing {
                        if !dimensions_agree(other, *dimension) {
                            return Err(Error::BindingMismatch(format!(
                                "module '{}' declares resource '{}' at slot {} as {:?}, previously {:?}",
                                module, name, slot, dimension, other
                            )));
                        }
                    }
                    symbols.check_slot(SlotKind::Resource, name, slot)?;
                    layout.symbols.insert_slot(SlotKind::Resource, name, slot)?;
                    layout.record.mark_resource(slot);
                    layout.resources.push((name.to_string(), slot, *dimension));
                }
                BindingKind::Sampler => {
                    check_slot_range(module, "sampler", name, slot, MAX_SAMPLER_SLOTS)?;
                    symbols.check_slot(SlotKind::Sampler, name, slot)?;
                    layout.symbols.insert_slot(SlotKind::Sampler, name, slot)?;
                    layout.record.mark_sampler(slot);
                    layout.samplers.push((name.to_string(), slot));
                }
                BindingKind::ReadWrite(dimension) => {
                    if !stage.supports_read_write() {
                        return Err(Error::BindingMismatch(format!(
                            "module '{}' declares read-write resource '{}' but {} stages cannot bind them",
                            module,
                            name,
                            stage.name()
                        )));
                    }
                    check_slot_range(module, "read-write resource", name, slot, MAX_READ_WRITE_SLOTS)?;
                    let existing = tables
                        .read_write(slot)
                        .map(|r| r.dimension)
                        .into_iter()
                        .chain(layout.read_write.iter().filter(|r| r.1 == slot).map(|r| r.2));
                    for other in existing {
                        if !dimensions_agree(other, *dimension) {
                            return Err(Error::BindingMismatch(format!(
                                "module '{}' declares read-write resource '{}' at slot {} as {:?}, previously {:?}",
                                module, name, slot, dimension, other
                            )));
                        }
                    }
                    symbols.check_slot(SlotKind::ReadWrite, name, slot)?;
                    layout.symbols.insert_slot(SlotKind::ReadWrite, name, slot)?;
                    layout.record.mark_read_write(slot);
                    layout.read_write.push((name.to_string(), slot, *dimension));
                }
            }
        }

        if let Some(parameters) = &layout.parameters {
            if layout.record.uses_uniform_block(parameters.slot) {
                return Err(Error::BindingMismatch(format!(
                    "module '{}' places its parameters at slot {}, which a uniform block already uses",
                    module, parameters.slot
                )));
            }
        }
        Ok(layout)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_uniform_block(
        &mut self,
        module: &str,
        name: &str,
        slot: u32,
        block: &ReflectedBlock,
        symbols: &SymbolTable,
        tables: &SharedTables,
        policy: BlockSizePolicy,
    ) -> Result<()> {
        // An empty block does not count as a use
        if block.members.is_empty() {
            return Ok(());
        }
        check_slot_range(module, "uniform block", name, slot, MAX_UNIFORM_BLOCK_SLOTS)?;
        if self.record.uses_uniform_block(slot) {
            return Err(Error::BindingMismatch(format!(
                "module '{}' declares two uniform blocks at slot {}",
                module, slot
            )));
        }

        let mut size = block.size;
        if let Some(shared) = tables.uniform_block(slot) {
            let shared = shared.borrow();
            if shared.name() != name {
                return Err(Error::BindingMismatch(format!(
                    "module '{}' declares uniform block '{}' at slot {}, which holds '{}'",
                    module,
                    name,
                    slot,
                    shared.name()
                )));
            }
            if shared.size() != block.size && policy == BlockSizePolicy::RequireExact {
                return Err(Error::BindingMismatch(format!(
                    "module '{}' declares uniform block '{}' with {} bytes, previously {}",
                    module,
                    name,
                    block.size,
                    shared.size()
                )));
            }
            size = size.max(shared.size());
        }

        let mut defaults = Vec::new();
        for member in &block.members {
            let entry = VariableEntry {
                slot,
                offset: member.offset,
                size: member.size,
            };
            symbols.check_variable(&member.name, &entry)?;
            self.symbols.insert_variable(&member.name, entry)?;
            if let Some(value) = &member.default_value {
                defaults.push((member.name.clone(), member.offset, value.clone()));
            }
        }

        self.record.mark_uniform_block(slot);
        self.blocks.push(StagedBlock {
            name: name.to_string(),
            slot,
            size,
            defaults,
        });
        Ok(())
    }

    /// Register the validated layout and build the module
    pub(crate) fn commit(
        self,
        name: &str,
        shader: Rc<dyn Shader>,
        symbols: &mut SymbolTable,
        tables: &mut SharedTables,
    ) -> Result<ShaderModule> {
        for staged in &self.blocks {
            let block = tables.ensure_uniform_block(&staged.name, staged.slot, staged.size);
            let mut block = block.borrow_mut();
            let previous = block.size();
            if block.grow(staged.size) {
                effect_warn!(
                    SOURCE,
                    "Uniform block '{}' at slot {} grows from {} to {} bytes for '{}'",
                    staged.name,
                    staged.slot,
                    previous,
                    staged.size,
                    name
                );
            }
            for (member, offset, value) in &staged.defaults {
                block.seed(member, *offset, value);
            }
        }
        for (resource, slot, dimension) in &self.resources {
            tables.ensure_resource(resource, *slot, *dimension);
        }
        for (sampler, slot) in &self.samplers {
            tables.ensure_sampler(sampler, *slot);
        }
        for (view, slot, dimension) in &self.read_write {
            tables.ensure_read_write(view, *slot, *dimension);
        }
        symbols.merge(&self.symbols)?;

        effect_debug!(
            SOURCE,
            "Ingested {} '{}': {} uniform block(s), {} resource(s), {} sampler(s), {} read-write, parameters: {}",
            self.stage.name(),
            name,
            self.blocks.len(),
            self.resources.len(),
            self.samplers.len(),
            self.read_write.len(),
            self.parameters.as_ref().map_or(0, |p| p.member_count())
        );

        Ok(ShaderModule {
            name: name.to_string(),
            stage: self.stage,
            shader,
            record: self.record,
            parameters: self.parameters,
            thread_group_size: self.thread_group_size,
        })
    }
}

#[cfg(test)]
#[path = "shader_module_tests.rs"]
mod tests;
