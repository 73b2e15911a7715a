/// Shader compiler front-end interface

use std::path::{Path, PathBuf};

use crate::effect::Result;
use crate::shader::ShaderStage;

/// Preprocessor definition passed to the compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderMacro {
    pub name: String,
    pub definition: String,
}

impl ShaderMacro {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// One compilation job
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    /// Source text
    pub source: &'a str,
    /// Where the source came from (for diagnostics and relative includes)
    pub path: &'a Path,
    pub stage: ShaderStage,
    pub entry_point: &'a str,
    pub macros: &'a [ShaderMacro],
    pub include_dirs: &'a [PathBuf],
    /// Keep debug info and skip optimization
    pub debug: bool,
}

/// Turns shader source into bytecode the matching reflector understands
pub trait ShaderCompiler {
    /// Compile the request, returning bytecode or the compiler's diagnostic
    /// text as [`Error::CompilationFailed`](crate::effect::Error)
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>>;

    /// Whether `bytes` already hold compiled bytecode rather than source text
    fn is_bytecode(&self, bytes: &[u8]) -> bool;

    /// Extension used for cached binaries
    fn binary_extension(&self) -> &str {
        "cso"
    }
}
