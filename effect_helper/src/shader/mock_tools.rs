/// Table-driven reflector and counting compiler for tests (no toolchain required)

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::effect::{Error, Result};
use crate::shader::{CompileRequest, ShaderCompiler, ShaderMacro, ShaderReflection, ShaderReflector, ShaderStage};

/// Reflector answering from a table keyed by bytecode
#[derive(Debug, Default, Clone)]
pub struct MockReflector {
    table: FxHashMap<Vec<u8>, ShaderReflection>,
}

impl MockReflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `reflection` whenever `bytecode` is reflected
    pub fn register(&mut self, bytecode: impl Into<Vec<u8>>, reflection: ShaderReflection) {
        self.table.insert(bytecode.into(), reflection);
    }

    pub fn with(mut self, bytecode: impl Into<Vec<u8>>, reflection: ShaderReflection) -> Self {
        self.register(bytecode, reflection);
        self
    }
}

impl ShaderReflector for MockReflector {
    fn reflect(&self, _stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderReflection> {
        self.table
            .get(bytecode)
            .cloned()
            .ok_or_else(|| Error::ReflectionFailed(format!("no reflection registered for {} bytes", bytecode.len())))
    }
}

/// Compiler that prefixes source text with a magic tag
///
/// Sources containing `#error` fail with a diagnostic; every call to
/// [`ShaderCompiler::compile`] is counted.
#[derive(Debug, Default, Clone)]
pub struct MockCompiler {
    compiles: Rc<Cell<u32>>,
    last_macros: Rc<RefCell<Vec<ShaderMacro>>>,
}

impl MockCompiler {
    /// Prefix marking mock bytecode
    pub const MAGIC: &'static [u8] = b"MOCKBC\0\0";

    pub fn new() -> Self {
        Self::default()
    }

    /// Bytecode the compiler produces for `source`
    pub fn bytecode_for(source: &str) -> Vec<u8> {
        let mut bytes = Self::MAGIC.to_vec();
        bytes.extend_from_slice(source.as_bytes());
        bytes
    }

    /// Shared counter of compile calls
    pub fn compile_count(&self) -> Rc<Cell<u32>> {
        self.compiles.clone()
    }

    /// Shared view of the macros passed to the most recent compile
    pub fn last_macros(&self) -> Rc<RefCell<Vec<ShaderMacro>>> {
        self.last_macros.clone()
    }
}

impl ShaderCompiler for MockCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>> {
        self.compiles.set(self.compiles.get() + 1);
        *self.last_macros.borrow_mut() = request.macros.to_vec();

        if let Some(line) = request.source.lines().position(|l| l.trim_start().starts_with("#error")) {
            return Err(Error::CompilationFailed(format!(
                "{}({}): error: #error directive",
                request.path.display(),
                line + 1
            )));
        }
        Ok(Self::bytecode_for(request.source))
    }

    fn is_bytecode(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(Self::MAGIC)
    }
}
