/// The effect runtime
///
/// An [`EffectHelper`] owns everything reflection produces: the symbol table,
/// the shared slot tables, the registered shader modules and the passes built
/// from them. It is an ordinary owned value; create as many as needed.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use effect_helper::effect::{EffectConfig, EffectHelper};
/// use effect_helper::effect::device::ResourceView;
/// use effect_helper::effect::mock::{MockDevice, MockReflector, MockView};
/// use effect_helper::effect::pass::PassDesc;
/// use effect_helper::effect::shader::{ReflectedBlock, ResourceDimension, ShaderReflection, ShaderStage};
///
/// let reflection = ShaderReflection::new()
///     .with_uniform_block("PerFrame", 0, ReflectedBlock::packed_floats(&[("color", 4)]))
///     .with_resource("tex", 0, ResourceDimension::Texture2D);
/// let reflector = MockReflector::new().with(b"ps".to_vec(), reflection);
///
/// let mut device = MockDevice::new();
/// let mut effect = EffectHelper::new(EffectConfig::default(), Box::new(reflector)).unwrap();
/// effect.add_shader_module(&mut device, "Basic_PS", ShaderStage::Pixel, b"ps").unwrap();
/// effect.add_pass(PassDesc::new("Basic").pixel("Basic_PS")).unwrap();
///
/// effect.variable("color").unwrap().set_float_vector(&[1.0, 0.0, 0.0, 1.0]);
/// let texture: Rc<dyn ResourceView> = MockView::new("brick");
/// effect.set_resource_by_name("tex", Some(&texture)).unwrap();
///
/// effect.pass("Basic").unwrap().apply(&mut device).unwrap();
/// ```

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::binding::{NameInsertError, NameTable, SharedTables, SlotKind, SymbolTable, Variable};
use crate::config::EffectConfig;
use crate::device::{Device, ReadWriteView, ResourceView, SamplerState};
use crate::effect::{Error, Result};
use crate::pass::{Pass, PassDesc};
use crate::shader::{
    BinaryCache, CompileRequest, ModuleLayout, ShaderCompiler, ShaderMacro, ShaderModule, ShaderReflector,
    ShaderStage,
};
use crate::{effect_debug, effect_error, effect_info};

const SOURCE: &str = "effect::Helper";

new_key_type! {
    /// Stable handle to a pass
    pub struct PassKey;
}

pub struct EffectHelper {
    config: EffectConfig,
    reflector: Box<dyn ShaderReflector>,
    compiler: Option<Box<dyn ShaderCompiler>>,
    cache: BinaryCache,
    symbols: SymbolTable,
    tables: Rc<RefCell<SharedTables>>,
    modules: NameTable<Rc<ShaderModule>>,
    passes: SlotMap<PassKey, Pass>,
    pass_names: NameTable<PassKey>,
}

/// Log a failure at ERROR severity and hand it back
fn log_and_return<T>(err: Error) -> Result<T> {
    effect_error!(SOURCE, "{}", err);
    Err(err)
}

fn name_error(err: NameInsertError, incoming: &str, duplicate: impl FnOnce(String) -> Error) -> Error {
    match err {
        NameInsertError::Occupied => duplicate(incoming.to_string()),
        NameInsertError::Collision { existing } => Error::NameCollision {
            existing,
            incoming: incoming.to_string(),
        },
    }
}

impl EffectHelper {
    /// Create a runtime reflecting bytecode with `reflector`
    ///
    /// Fails if `config.binary_cache_dir` is set and cannot be created.
    pub fn new(config: EffectConfig, reflector: Box<dyn ShaderReflector>) -> Result<Self> {
        let mut cache = BinaryCache::disabled();
        if let Some(dir) = &config.binary_cache_dir {
            cache.set_directory(dir, config.force_rewrite).or_else(log_and_return)?;
        }
        Ok(Self {
            config,
            reflector,
            compiler: None,
            cache,
            symbols: SymbolTable::new(),
            tables: Rc::new(RefCell::new(SharedTables::new())),
            modules: NameTable::new(),
            passes: SlotMap::with_key(),
            pass_names: NameTable::new(),
        })
    }

    /// Use `compiler` for [`EffectHelper::create_shader_from_file`]
    pub fn with_compiler(mut self, compiler: Box<dyn ShaderCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn set_compiler(&mut self, compiler: Box<dyn ShaderCompiler>) {
        self.compiler = Some(compiler);
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn binary_cache(&self) -> &BinaryCache {
        &self.cache
    }

    // ===== BINARY CACHE =====

    /// Store compiled binaries in `dir`, one file per logical shader name
    ///
    /// With `force_rewrite`, cached binaries are ignored and every shader is
    /// recompiled and rewritten.
    pub fn set_binary_cache_directory(&mut self, dir: impl AsRef<Path>, force_rewrite: bool) -> Result<()> {
        let dir = dir.as_ref();
        self.cache.set_directory(dir, force_rewrite).or_else(log_and_return)?;
        self.config.binary_cache_dir = Some(dir.to_path_buf());
        self.config.force_rewrite = force_rewrite;
        Ok(())
    }

    /// Stop reading and writing cached binaries
    pub fn clear_binary_cache_directory(&mut self) {
        self.cache.clear_directory();
        self.config.binary_cache_dir = None;
        self.config.force_rewrite = false;
    }

    // ===== SHADER MODULES =====

    fn check_module_name(&self, name: &str) -> Result<()> {
        if let Some(existing) = self.modules.collision_for(name) {
            return Err(Error::NameCollision {
                existing: existing.to_string(),
                incoming: name.to_string(),
            });
        }
        if self.modules.contains(name) {
            return Err(Error::DuplicateShader(name.to_string()));
        }
        Ok(())
    }

    /// Reflect compiled `bytecode` and register it as module `name`
    ///
    /// Nothing is registered if any binding conflicts with what earlier
    /// modules declared.
    pub fn add_shader_module(
        &mut self,
        device: &mut dyn Device,
        name: &str,
        stage: ShaderStage,
        bytecode: &[u8],
    ) -> Result<Rc<ShaderModule>> {
        self.ingest(device, name, stage, bytecode).or_else(log_and_return)
    }

    fn ingest(
        &mut self,
        device: &mut dyn Device,
        name: &str,
        stage: ShaderStage,
        bytecode: &[u8],
    ) -> Result<Rc<ShaderModule>> {
        self.check_module_name(name)?;
        let reflection = self.reflector.reflect(stage, bytecode)?;
        let layout = ModuleLayout::plan(
            name,
            stage,
            &reflection,
            &self.symbols,
            &self.tables.borrow(),
            self.config.block_size_policy,
        )?;
        let shader = device.create_shader(name, stage, bytecode)?;
        let module = Rc::new(layout.commit(name, shader, &mut self.symbols, &mut self.tables.borrow_mut())?);
        self.modules
            .insert(name, module.clone())
            .map_err(|e| name_error(e, name, Error::DuplicateShader))?;
        Ok(module)
    }

    /// Load, compile if needed, and register module `name` from `path`
    ///
    /// A cached binary under `name` is used when the cache is enabled and
    /// rewriting is not forced. Otherwise the file is read: compiled bytecode
    /// is used as is, source text goes through the compiler and the result is
    /// written to the cache.
    pub fn create_shader_from_file(
        &mut self,
        device: &mut dyn Device,
        name: &str,
        path: impl AsRef<Path>,
        stage: ShaderStage,
        entry_point: &str,
        macros: &[ShaderMacro],
    ) -> Result<Rc<ShaderModule>> {
        let path = path.as_ref();
        self.check_module_name(name).or_else(log_and_return)?;
        let bytecode = self.load_bytecode(name, path, stage, entry_point, macros).or_else(log_and_return)?;
        self.add_shader_module(device, name, stage, &bytecode)
    }

    fn load_bytecode(
        &self,
        name: &str,
        path: &Path,
        stage: ShaderStage,
        entry_point: &str,
        macros: &[ShaderMacro],
    ) -> Result<Vec<u8>> {
        let extension = self
            .compiler
            .as_ref()
            .map_or("cso", |compiler| compiler.binary_extension());
        if let Some(bytes) = self.cache.load(name, extension) {
            return Ok(bytes);
        }

        let bytes = fs::read(path).map_err(|e| Error::Io(format!("cannot read {}: {}", path.display(), e)))?;
        let Some(compiler) = self.compiler.as_ref() else {
            return Ok(bytes);
        };
        if compiler.is_bytecode(&bytes) {
            return Ok(bytes);
        }

        let source = String::from_utf8(bytes)
            .map_err(|_| Error::CompilationFailed(format!("{} is neither bytecode nor UTF-8 source", path.display())))?;
        let request = CompileRequest {
            source: &source,
            path,
            stage,
            entry_point,
            macros,
            include_dirs: &self.config.compile_include_dirs,
            debug: self.config.debug_shaders,
        };
        let bytecode = compiler.compile(&request)?;
        effect_debug!(
            SOURCE,
            "Compiled '{}' from {} ({} bytes)",
            name,
            path.display(),
            bytecode.len()
        );
        self.cache.store(name, extension, &bytecode);
        Ok(bytecode)
    }

    pub fn shader_module(&self, name: &str) -> Option<&Rc<ShaderModule>> {
        self.modules.get(name)
    }

    pub fn shader_module_count(&self) -> usize {
        self.modules.len()
    }

    // ===== PASSES =====

    /// Build a pass from registered modules
    ///
    /// Fails on an unknown module name, a module used for the wrong stage, or
    /// a pass name already taken (the existing pass is left untouched).
    pub fn add_pass(&mut self, desc: PassDesc) -> Result<PassKey> {
        self.build_pass(desc).or_else(log_and_return)
    }

    fn build_pass(&mut self, desc: PassDesc) -> Result<PassKey> {
        if let Some(existing) = self.pass_names.collision_for(&desc.name) {
            return Err(Error::NameCollision {
                existing: existing.to_string(),
                incoming: desc.name.clone(),
            });
        }
        if self.pass_names.contains(&desc.name) {
            return Err(Error::DuplicatePass(desc.name.clone()));
        }

        let mut modules: [Option<Rc<ShaderModule>>; ShaderStage::COUNT] = Default::default();
        for (stage, module_name) in desc.stages() {
            let module = self
                .modules
                .get(module_name)
                .ok_or_else(|| Error::UnknownShader(module_name.to_string()))?;
            if module.stage() != stage {
                return Err(Error::BindingMismatch(format!(
                    "pass '{}' uses {} module '{}' as its {} stage",
                    desc.name,
                    module.stage().name(),
                    module_name,
                    stage.name()
                )));
            }
            modules[stage.index()] = Some(module.clone());
        }

        let pass = Pass::new(&desc.name, modules, self.tables.clone());
        let key = self.passes.insert(pass);
        if let Err(e) = self.pass_names.insert(&desc.name, key) {
            self.passes.remove(key);
            return Err(name_error(e, &desc.name, Error::DuplicatePass));
        }
        effect_info!(
            SOURCE,
            "Created pass '{}' ({})",
            desc.name,
            desc.stages().map(|(_, name)| name).collect::<Vec<_>>().join(", ")
        );
        Ok(key)
    }

    pub fn pass(&self, name: &str) -> Option<&Pass> {
        self.pass_key(name).and_then(|key| self.passes.get(key))
    }

    pub fn pass_mut(&mut self, name: &str) -> Option<&mut Pass> {
        let key = self.pass_key(name)?;
        self.passes.get_mut(key)
    }

    pub fn pass_key(&self, name: &str) -> Option<PassKey> {
        self.pass_names.get(name).copied()
    }

    pub fn pass_by_key(&self, key: PassKey) -> Option<&Pass> {
        self.passes.get(key)
    }

    pub fn pass_by_key_mut(&mut self, key: PassKey) -> Option<&mut Pass> {
        self.passes.get_mut(key)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    // ===== VARIABLES =====

    /// Handle to a uniform-block member declared by any module
    pub fn variable(&self, name: &str) -> Option<Variable> {
        let entry = *self.symbols.variable(name)?;
        let block = self.tables.borrow().uniform_block(entry.slot)?.clone();
        Some(Variable::new(block, name, entry.offset, entry.size))
    }

    // ===== RESOURCES =====

    fn slot_by_name(&self, kind: SlotKind, name: &str) -> Result<u32> {
        self.symbols
            .slot(kind, name)
            .ok_or_else(|| Error::UnknownBinding(format!("no {} named '{}'", kind.label(), name)))
    }

    fn unknown_slot(kind: SlotKind, slot: u32) -> Error {
        Error::UnknownBinding(format!("no {} at slot {}", kind.label(), slot))
    }

    pub fn map_resource_slot(&self, name: &str) -> Option<u32> {
        self.symbols.slot(SlotKind::Resource, name)
    }

    /// Bind `view` (held weakly) to a resource slot
    pub fn set_resource_by_slot(&mut self, slot: u32, view: Option<&Rc<dyn ResourceView>>) -> Result<()> {
        match self.tables.borrow_mut().resource_mut(slot) {
            Some(entry) => {
                entry.set_view(view);
                Ok(())
            }
            None => log_and_return(Self::unknown_slot(SlotKind::Resource, slot)),
        }
    }

    pub fn set_resource_by_name(&mut self, name: &str, view: Option<&Rc<dyn ResourceView>>) -> Result<()> {
        let slot = self.slot_by_name(SlotKind::Resource, name).or_else(log_and_return)?;
        self.set_resource_by_slot(slot, view)
    }

    pub fn map_sampler_slot(&self, name: &str) -> Option<u32> {
        self.symbols.slot(SlotKind::Sampler, name)
    }

    pub fn set_sampler_by_slot(&mut self, slot: u32, sampler: Option<&Rc<dyn SamplerState>>) -> Result<()> {
        match self.tables.borrow_mut().sampler_mut(slot) {
            Some(entry) => {
                entry.set_sampler(sampler);
                Ok(())
            }
            None => log_and_return(Self::unknown_slot(SlotKind::Sampler, slot)),
        }
    }

    pub fn set_sampler_by_name(&mut self, name: &str, sampler: Option<&Rc<dyn SamplerState>>) -> Result<()> {
        let slot = self.slot_by_name(SlotKind::Sampler, name).or_else(log_and_return)?;
        self.set_sampler_by_slot(slot, sampler)
    }

    pub fn map_read_write_slot(&self, name: &str) -> Option<u32> {
        self.symbols.slot(SlotKind::ReadWrite, name)
    }

    /// Bind a read-write view; `initial_count` resets its hidden counter on
    /// the next bind only
    pub fn set_read_write_by_slot(
        &mut self,
        slot: u32,
        view: Option<&Rc<dyn ReadWriteView>>,
        initial_count: Option<u32>,
    ) -> Result<()> {
        match self.tables.borrow_mut().read_write_mut(slot) {
            Some(entry) => {
                entry.set_view(view, initial_count);
                Ok(())
            }
            None => log_and_return(Self::unknown_slot(SlotKind::ReadWrite, slot)),
        }
    }

    pub fn set_read_write_by_name(
        &mut self,
        name: &str,
        view: Option<&Rc<dyn ReadWriteView>>,
        initial_count: Option<u32>,
    ) -> Result<()> {
        let slot = self.slot_by_name(SlotKind::ReadWrite, name).or_else(log_and_return)?;
        self.set_read_write_by_slot(slot, view, initial_count)
    }

    // ===== TEARDOWN =====

    /// Drop every pass, module, symbol and table entry
    ///
    /// The cache directory and compiler are kept, so the runtime can be
    /// initialized again.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.pass_names.clear();
        self.modules.clear();
        self.symbols.clear();
        self.tables.borrow_mut().clear();
        effect_debug!(SOURCE, "Cleared effect runtime");
    }
}

#[cfg(test)]
#[path = "effect_helper_tests.rs"]
mod tests;
