//! Integration tests for shader loading and the binary cache
//!
//! Source files are compiled by the counting mock compiler and cached under a
//! temporary directory, one file per logical shader name.
//!
//! Run with: cargo test --test cache_integration_tests

use std::fs;
use std::path::Path;

use effect_helper::effect::mock::{MockCompiler, MockDevice, MockReflector};
use effect_helper::effect::shader::{ReflectedBlock, ShaderMacro, ShaderReflection, ShaderStage};
use effect_helper::effect::{EffectConfig, EffectHelper, Error};

const BLUR_SOURCE: &str = "cbuffer Blur : register(b0) { float4 g_Weights; };\nvoid main() {}\n";
const BLUR_SOURCE_V2: &str = "cbuffer Blur : register(b0) { float4 g_Weights; };\nvoid main() { }\n";

// ============================================================================
// HELPERS
// ============================================================================

fn reflector() -> MockReflector {
    let reflection =
        ShaderReflection::new().with_uniform_block("Blur", 0, ReflectedBlock::packed_floats(&[("g_Weights", 4)]));
    MockReflector::new()
        .with(MockCompiler::bytecode_for(BLUR_SOURCE), reflection.clone())
        .with(MockCompiler::bytecode_for(BLUR_SOURCE_V2), reflection)
}

fn runtime(compiler: &MockCompiler, cache_dir: &Path, force_rewrite: bool) -> EffectHelper {
    let mut effect = EffectHelper::new(EffectConfig::default(), Box::new(reflector()))
        .unwrap()
        .with_compiler(Box::new(compiler.clone()));
    effect.set_binary_cache_directory(cache_dir, force_rewrite).unwrap();
    effect
}

fn load_blur(effect: &mut EffectHelper, device: &mut MockDevice, path: &Path) -> Result<(), Error> {
    effect
        .create_shader_from_file(device, "Blur_PS", path, ShaderStage::Pixel, "main", &[])
        .map(|_| ())
}

// ============================================================================
// CACHE REUSE
// ============================================================================

#[test]
fn test_integration_cached_binary_skips_compilation() {
    let sources = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let source_path = sources.path().join("blur.hlsl");
    fs::write(&source_path, BLUR_SOURCE).unwrap();

    let compiler = MockCompiler::new();
    let compiles = compiler.compile_count();
    let mut device = MockDevice::new();

    let mut first = runtime(&compiler, cache.path(), false);
    load_blur(&mut first, &mut device, &source_path).unwrap();
    assert_eq!(compiles.get(), 1);

    let cached = cache.path().join("Blur_PS.cso");
    assert_eq!(fs::read(&cached).unwrap(), MockCompiler::bytecode_for(BLUR_SOURCE));

    // A second runtime finds the binary without touching the source
    fs::remove_file(&source_path).unwrap();
    let mut second = runtime(&compiler, cache.path(), false);
    load_blur(&mut second, &mut device, &source_path).unwrap();
    assert_eq!(compiles.get(), 1);
    assert!(second.variable("g_Weights").is_some());
}

#[test]
fn test_integration_force_rewrite_recompiles_every_time() {
    let sources = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let source_path = sources.path().join("blur.hlsl");
    fs::write(&source_path, BLUR_SOURCE).unwrap();

    let compiler = MockCompiler::new();
    let compiles = compiler.compile_count();
    let mut device = MockDevice::new();

    let mut first = runtime(&compiler, cache.path(), true);
    load_blur(&mut first, &mut device, &source_path).unwrap();
    assert_eq!(compiles.get(), 1);

    fs::write(&source_path, BLUR_SOURCE_V2).unwrap();
    let mut second = runtime(&compiler, cache.path(), true);
    load_blur(&mut second, &mut device, &source_path).unwrap();
    assert_eq!(compiles.get(), 2);

    let cached = fs::read(cache.path().join("Blur_PS.cso")).unwrap();
    assert_eq!(cached, MockCompiler::bytecode_for(BLUR_SOURCE_V2));
}

#[test]
fn test_integration_precompiled_file_bypasses_compiler() {
    let sources = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let binary_path = sources.path().join("blur.cso");
    fs::write(&binary_path, MockCompiler::bytecode_for(BLUR_SOURCE)).unwrap();

    let compiler = MockCompiler::new();
    let compiles = compiler.compile_count();
    let mut device = MockDevice::new();

    let mut effect = runtime(&compiler, cache.path(), false);
    load_blur(&mut effect, &mut device, &binary_path).unwrap();

    assert_eq!(compiles.get(), 0);
    assert_eq!(effect.shader_module_count(), 1);
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_integration_compile_error_registers_nothing() {
    let sources = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let source_path = sources.path().join("broken.hlsl");
    fs::write(&source_path, "void main() {}\n#error missing include\n").unwrap();

    let compiler = MockCompiler::new();
    let mut device = MockDevice::new();
    let mut effect = runtime(&compiler, cache.path(), false);

    let result = load_blur(&mut effect, &mut device, &source_path);

    match result {
        Err(Error::CompilationFailed(msg)) => assert!(msg.contains("broken.hlsl(2)")),
        other => panic!("expected compilation failure, got {:?}", other),
    }
    assert_eq!(effect.shader_module_count(), 0);
    assert!(!cache.path().join("Blur_PS.cso").exists());
    assert!(device.calls().is_empty());
}

#[test]
fn test_integration_missing_source_is_io_error() {
    let cache = tempfile::tempdir().unwrap();
    let compiler = MockCompiler::new();
    let mut device = MockDevice::new();
    let mut effect = runtime(&compiler, cache.path(), false);

    let result = load_blur(&mut effect, &mut device, &cache.path().join("nowhere.hlsl"));

    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_integration_macros_reach_the_compiler() {
    let sources = tempfile::tempdir().unwrap();
    let source_path = sources.path().join("blur.hlsl");
    fs::write(&source_path, BLUR_SOURCE).unwrap();

    let compiler = MockCompiler::new();
    let macros = compiler.last_macros();
    let mut device = MockDevice::new();
    let mut effect = EffectHelper::new(EffectConfig::default(), Box::new(reflector()))
        .unwrap()
        .with_compiler(Box::new(compiler.clone()));

    let defines = [ShaderMacro::new("TAPS", "9"), ShaderMacro::new("HORIZONTAL", "1")];
    effect
        .create_shader_from_file(&mut device, "Blur_PS", &source_path, ShaderStage::Pixel, "main", &defines)
        .unwrap();

    assert_eq!(*macros.borrow(), defines.to_vec());
}
