/// On-disk cache of compiled shader bytecode
///
/// One file per logical shader name: `<dir>/<name>.<ext>`. The content is
/// whatever the compiler produced; the cache never interprets it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::effect::{Error, Result};
use crate::{effect_trace, effect_warn};

const SOURCE: &str = "effect::BinaryCache";

#[derive(Debug, Clone, Default)]
pub struct BinaryCache {
    dir: Option<PathBuf>,
    force_rewrite: bool,
}

impl BinaryCache {
    /// Cache with no directory (every lookup misses, every store is skipped)
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Point the cache at `dir`, creating the directory if needed
    ///
    /// With `force_rewrite`, lookups always miss so that every shader is
    /// recompiled and its cached binary overwritten.
    pub fn set_directory(&mut self, dir: impl AsRef<Path>, force_rewrite: bool) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            Error::Io(format!("cannot create cache directory {}: {}", dir.display(), e))
        })?;
        self.dir = Some(dir.to_path_buf());
        self.force_rewrite = force_rewrite;
        Ok(())
    }

    /// Stop caching
    pub fn clear_directory(&mut self) {
        self.dir = None;
        self.force_rewrite = false;
    }

    pub fn directory(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn force_rewrite(&self) -> bool {
        self.force_rewrite
    }

    /// Cache file for a logical name
    pub fn path_for(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let file_name: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", file_name, extension)))
    }

    /// Cached bytecode for `name`, unless caching is off or rewrite is forced
    pub fn load(&self, name: &str, extension: &str) -> Option<Vec<u8>> {
        if self.force_rewrite {
            return None;
        }
        let path = self.path_for(name, extension)?;
        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => {
                effect_trace!(SOURCE, "Cache hit for '{}' ({})", name, path.display());
                Some(bytes)
            }
            _ => None,
        }
    }

    /// Persist bytecode for `name`
    ///
    /// Failures are logged and swallowed: the bytecode is already usable in
    /// memory.
    pub fn store(&self, name: &str, extension: &str, bytecode: &[u8]) {
        let Some(path) = self.path_for(name, extension) else {
            return;
        };
        if let Err(e) = fs::write(&path, bytecode) {
            effect_warn!(SOURCE, "Failed to write cached binary {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
#[path = "binary_cache_tests.rs"]
mod tests;
