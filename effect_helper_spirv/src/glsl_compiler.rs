/// GLSL to SPIR-V compilation through naga
///
/// Macros become preprocessor defines. The GLSL front end has no `#include`
/// support, so include directories are ignored, and the SPIR-V writer has no
/// optimizer, so the debug flag only shows up in the log.

use effect_helper::effect::shader::{CompileRequest, ShaderCompiler, ShaderStage};
use effect_helper::effect::{Error, Result};
use effect_helper::effect_debug;

use crate::spirv::{is_spirv, words_to_bytes};

const SOURCE: &str = "effect::glsl";

/// [`ShaderCompiler`] producing SPIR-V from GLSL source
#[derive(Debug, Clone, Default)]
pub struct GlslCompiler;

impl GlslCompiler {
    pub fn new() -> Self {
        Self
    }
}

fn naga_stage(stage: ShaderStage) -> Option<naga::ShaderStage> {
    match stage {
        ShaderStage::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderStage::Pixel => Some(naga::ShaderStage::Fragment),
        ShaderStage::Compute => Some(naga::ShaderStage::Compute),
        ShaderStage::Hull | ShaderStage::Domain | ShaderStage::Geometry => None,
    }
}

impl ShaderCompiler for GlslCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>> {
        let path = request.path.display().to_string();
        let stage = naga_stage(request.stage).ok_or_else(|| {
            Error::CompilationFailed(format!(
                "{}: {} shaders are not supported by the GLSL front end",
                path,
                request.stage.name()
            ))
        })?;

        let mut options = naga::front::glsl::Options::from(stage);
        for define in request.macros {
            options.defines.insert(define.name.clone(), define.definition.clone());
        }
        let module = naga::front::glsl::Frontend::default()
            .parse(&options, request.source)
            .map_err(|e| Error::CompilationFailed(e.emit_to_string_with_path(request.source, &path)))?;

        let info = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
            .validate(&module)
            .map_err(|e| Error::CompilationFailed(e.emit_to_string_with_path(request.source, &path)))?;

        // Debug names are always emitted: bindings are resolved by name
        let mut spv_options = naga::back::spv::Options::default();
        spv_options.flags.insert(naga::back::spv::WriterFlags::DEBUG);
        let pipeline_options = naga::back::spv::PipelineOptions {
            shader_stage: stage,
            entry_point: request.entry_point.to_string(),
        };
        let words = naga::back::spv::write_vec(&module, &info, &spv_options, Some(&pipeline_options))
            .map_err(|e| Error::CompilationFailed(format!("{}: SPIR-V generation failed: {}", path, e)))?;

        effect_debug!(
            SOURCE,
            "Compiled {} ({} entry '{}', {} defines, debug={}) to {} words",
            path,
            request.stage.name(),
            request.entry_point,
            request.macros.len(),
            request.debug,
            words.len()
        );
        Ok(words_to_bytes(&words))
    }

    fn is_bytecode(&self, bytes: &[u8]) -> bool {
        is_spirv(bytes)
    }

    fn binary_extension(&self) -> &str {
        "spv"
    }
}

#[cfg(test)]
#[path = "glsl_compiler_tests.rs"]
mod tests;
