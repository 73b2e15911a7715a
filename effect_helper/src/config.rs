/// Runtime configuration

use std::path::PathBuf;

/// How ingestion reacts when two modules declare the same uniform block slot
/// with different byte sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockSizePolicy {
    /// Grow the shared block to the larger size. Offsets below the old size
    /// stay valid, which covers optional trailing members behind macros.
    #[default]
    KeepLarger,
    /// Reject any size difference with [`Error::BindingMismatch`](crate::effect::Error)
    RequireExact,
}

/// Effect runtime configuration
#[derive(Debug, Clone)]
pub struct EffectConfig {
    /// Directory holding compiled shader binaries, one file per logical name
    pub binary_cache_dir: Option<PathBuf>,
    /// Ignore cached binaries and recompile (overwriting the cache) every time
    pub force_rewrite: bool,
    /// Policy for uniform blocks whose size differs between modules
    pub block_size_policy: BlockSizePolicy,
    /// Compile with debug info and without optimization
    pub debug_shaders: bool,
    /// Extra include directories forwarded to the shader compiler
    pub compile_include_dirs: Vec<PathBuf>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            binary_cache_dir: None,
            force_rewrite: false,
            block_size_policy: BlockSizePolicy::KeepLarger,
            debug_shaders: cfg!(debug_assertions),
            compile_include_dirs: Vec::new(),
        }
    }
}
