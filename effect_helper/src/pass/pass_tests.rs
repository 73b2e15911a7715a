//! Unit tests for pass.rs
//!
//! Passes are assembled from ingested modules by hand and applied on a
//! MockDevice, so every emitted device call can be checked.

use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::{SharedTables, SymbolTable};
use crate::config::BlockSizePolicy;
use crate::device::{
    CullMode, DeviceCall, Device, MockDevice, MockView, RasterizerState, ReadWriteView, ResourceView,
};
use crate::effect::Error;
use crate::pass::{Pass, PassDesc};
use crate::shader::{
    ModuleLayout, ReflectedBlock, ResourceDimension, ShaderModule, ShaderReflection, ShaderStage,
    ShaderStageFlags,
};

// ============================================================================
// HELPERS
// ============================================================================

struct Fixture {
    device: MockDevice,
    symbols: SymbolTable,
    tables: Rc<RefCell<SharedTables>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            device: MockDevice::new(),
            symbols: SymbolTable::new(),
            tables: Rc::new(RefCell::new(SharedTables::new())),
        }
    }

    fn module(&mut self, name: &str, stage: ShaderStage, reflection: ShaderReflection) -> Rc<ShaderModule> {
        let mut tables = self.tables.borrow_mut();
        let layout = ModuleLayout::plan(
            name,
            stage,
            &reflection,
            &self.symbols,
            &tables,
            BlockSizePolicy::KeepLarger,
        )
        .unwrap();
        let shader = self.device.create_shader(name, stage, &[]).unwrap();
        Rc::new(layout.commit(name, shader, &mut self.symbols, &mut tables).unwrap())
    }

    fn pass(&self, name: &str, modules: &[Rc<ShaderModule>]) -> Pass {
        let mut slots: [Option<Rc<ShaderModule>>; ShaderStage::COUNT] = Default::default();
        for module in modules {
            slots[module.stage().index()] = Some(module.clone());
        }
        Pass::new(name, slots, self.tables.clone())
    }
}

fn binding_calls(calls: &[DeviceCall]) -> Vec<DeviceCall> {
    calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                DeviceCall::BindUniformBuffers { .. }
                    | DeviceCall::BindResources { .. }
                    | DeviceCall::BindSamplers { .. }
                    | DeviceCall::BindReadWrite { .. }
            )
        })
        .cloned()
        .collect()
}

// ============================================================================
// PASS DESC
// ============================================================================

#[test]
fn test_pass_desc_lists_stages_in_pipeline_order() {
    let desc = PassDesc::new("Lit").pixel("Lit_PS").vertex("Lit_VS");
    let stages: Vec<(ShaderStage, &str)> = desc.stages().collect();
    assert_eq!(
        stages,
        vec![(ShaderStage::Vertex, "Lit_VS"), (ShaderStage::Pixel, "Lit_PS")]
    );
}

#[test]
fn test_active_stages_follow_modules() {
    let mut fx = Fixture::new();
    let vs = fx.module("Basic_VS", ShaderStage::Vertex, ShaderReflection::new());
    let ps = fx.module("Basic_PS", ShaderStage::Pixel, ShaderReflection::new());
    let pass = fx.pass("Basic", &[vs, ps]);

    assert_eq!(pass.active_stages(), ShaderStageFlags::VERTEX | ShaderStageFlags::PIXEL);
    assert!(!pass.active_stages().contains(ShaderStageFlags::COMPUTE));
    let debug = format!("{:?}", pass);
    assert!(debug.contains("VERTEX | PIXEL"), "{debug}");
    assert!(fx.pass("Empty", &[]).active_stages().is_empty());
}

// ============================================================================
// APPLY
// ============================================================================

#[test]
fn test_apply_binds_every_stage_in_order() {
    let mut fx = Fixture::new();
    let vs = fx.module("Basic_VS", ShaderStage::Vertex, ShaderReflection::new());
    let ps = fx.module("Basic_PS", ShaderStage::Pixel, ShaderReflection::new());
    let pass = fx.pass("Basic", &[vs, ps]);
    fx.device.take_calls();

    pass.apply(&mut fx.device).unwrap();

    let shaders: Vec<(ShaderStage, Option<String>)> = fx
        .device
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::BindShader { stage, shader } => Some((*stage, shader.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        shaders,
        vec![
            (ShaderStage::Vertex, Some("Basic_VS".to_string())),
            (ShaderStage::Hull, None),
            (ShaderStage::Domain, None),
            (ShaderStage::Geometry, None),
            (ShaderStage::Pixel, Some("Basic_PS".to_string())),
            (ShaderStage::Compute, None),
        ]
    );
}

#[test]
fn test_uniform_runs_are_compressed() {
    let mut fx = Fixture::new();
    let block = |name: &str| ReflectedBlock::packed_floats(&[(name, 4)]);
    let reflection = ShaderReflection::new()
        .with_uniform_block("B1", 1, block("one"))
        .with_uniform_block("B2", 2, block("two"))
        .with_uniform_block("B4", 4, block("four"));
    let ps = fx.module("Runs_PS", ShaderStage::Pixel, reflection);
    let pass = fx.pass("Runs", &[ps]);

    pass.apply(&mut fx.device).unwrap();

    let binds = binding_calls(fx.device.calls());
    assert_eq!(
        binds,
        vec![
            DeviceCall::BindUniformBuffers {
                stage: ShaderStage::Pixel,
                start_slot: 1,
                buffers: vec!["B1".to_string(), "B2".to_string()],
            },
            DeviceCall::BindUniformBuffers {
                stage: ShaderStage::Pixel,
                start_slot: 4,
                buffers: vec!["B4".to_string()],
            },
        ]
    );
}

#[test]
fn test_second_apply_uploads_nothing() {
    let mut fx = Fixture::new();
    let reflection =
        ShaderReflection::new().with_uniform_block("Frame", 0, ReflectedBlock::packed_floats(&[("t", 1)]));
    let vs = fx.module("Frame_VS", ShaderStage::Vertex, reflection);
    let pass = fx.pass("Frame", &[vs]);

    pass.apply(&mut fx.device).unwrap();
    assert_eq!(fx.device.uploads().len(), 1);
    fx.device.take_calls();

    pass.apply(&mut fx.device).unwrap();
    assert!(fx.device.uploads().is_empty());
    assert_eq!(fx.device.count(|c| matches!(c, DeviceCall::BindUniformBuffers { .. })), 1);
}

#[test]
fn test_resources_and_samplers_bound_by_run() {
    let mut fx = Fixture::new();
    let reflection = ShaderReflection::new()
        .with_resource("albedo", 0, ResourceDimension::Texture2D)
        .with_resource("normal", 1, ResourceDimension::Texture2D)
        .with_resource("shadow", 40, ResourceDimension::Texture2D)
        .with_sampler("linear", 0);
    let ps = fx.module("Mat_PS", ShaderStage::Pixel, reflection);
    let pass = fx.pass("Mat", &[ps]);

    let albedo: Rc<dyn ResourceView> = MockView::new("brick_albedo");
    fx.tables.borrow_mut().resource_mut(0).unwrap().set_view(Some(&albedo));

    pass.apply(&mut fx.device).unwrap();

    assert_eq!(
        binding_calls(fx.device.calls()),
        vec![
            DeviceCall::BindSamplers {
                stage: ShaderStage::Pixel,
                start_slot: 0,
                samplers: vec![None],
            },
            DeviceCall::BindResources {
                stage: ShaderStage::Pixel,
                start_slot: 0,
                views: vec![Some("brick_albedo".to_string()), None],
            },
            DeviceCall::BindResources {
                stage: ShaderStage::Pixel,
                start_slot: 40,
                views: vec![None],
            },
        ]
    );
}

#[test]
fn test_dropped_view_binds_as_empty() {
    let mut fx = Fixture::new();
    let ps = fx.module(
        "Tex_PS",
        ShaderStage::Pixel,
        ShaderReflection::new().with_resource("tex", 0, ResourceDimension::Texture2D),
    );
    let pass = fx.pass("Tex", &[ps]);
    {
        let view: Rc<dyn ResourceView> = MockView::new("temp");
        fx.tables.borrow_mut().resource_mut(0).unwrap().set_view(Some(&view));
    }
    pass.apply(&mut fx.device).unwrap();
    assert!(fx.device.calls().contains(&DeviceCall::BindResources {
        stage: ShaderStage::Pixel,
        start_slot: 0,
        views: vec![None],
    }));
}

#[test]
fn test_read_write_initial_count_passed_once() {
    let mut fx = Fixture::new();
    let cs = fx.module(
        "Append_CS",
        ShaderStage::Compute,
        ShaderReflection::new().with_read_write("gOut", 2, ResourceDimension::Buffer),
    );
    let pass = fx.pass("Append", &[cs]);
    let view: Rc<dyn ReadWriteView> = MockView::new("particles");
    fx.tables
        .borrow_mut()
        .read_write_mut(2)
        .unwrap()
        .set_view(Some(&view), Some(0));

    pass.apply(&mut fx.device).unwrap();
    pass.apply(&mut fx.device).unwrap();

    let counts: Vec<Option<u32>> = fx
        .device
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::BindReadWrite { slot: 2, initial_count, .. } => Some(*initial_count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![Some(0), None]);
}

#[test]
fn test_state_is_applied_last() {
    let mut fx = Fixture::new();
    let vs = fx.module("S_VS", ShaderStage::Vertex, ShaderReflection::new());
    let mut pass = fx.pass("S", &[vs]);
    let wire = RasterizerState {
        cull_mode: CullMode::None,
        ..Default::default()
    };
    pass.set_rasterizer_state(Some(wire));
    pass.set_depth_stencil_state(None, 3);

    pass.apply(&mut fx.device).unwrap();

    let calls = fx.device.calls();
    let n = calls.len();
    assert_eq!(calls[n - 3], DeviceCall::SetRasterizerState(Some(wire)));
    assert!(matches!(calls[n - 2], DeviceCall::SetBlendState { state: None, sample_mask: u32::MAX, .. }));
    assert_eq!(
        calls[n - 1],
        DeviceCall::SetDepthStencilState {
            state: None,
            stencil_ref: 3,
        }
    );
}

#[test]
fn test_missing_table_entry_fails_loudly() {
    let mut fx = Fixture::new();
    let ps = fx.module(
        "Lost_PS",
        ShaderStage::Pixel,
        ShaderReflection::new().with_resource("tex", 5, ResourceDimension::Texture2D),
    );
    let pass = fx.pass("Lost", &[ps]);
    fx.tables.borrow_mut().clear();

    let err = pass.apply(&mut fx.device).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

// ============================================================================
// PARAMETERS
// ============================================================================

#[test]
fn test_parameters_are_per_pass() {
    let mut fx = Fixture::new();
    let params = ReflectedBlock::packed_floats(&[("radius", 1)]);
    let cs = fx.module(
        "Blur_CS",
        ShaderStage::Compute,
        ShaderReflection::new().with_parameters(3, params),
    );
    let a = fx.pass("BlurA", &[cs.clone()]);
    let b = fx.pass("BlurB", &[cs]);

    a.param(ShaderStage::Compute, "radius").unwrap().set_float(4.0);

    assert_eq!(
        a.param(ShaderStage::Compute, "radius").unwrap().raw(),
        4.0f32.to_ne_bytes().to_vec()
    );
    assert_eq!(b.param(ShaderStage::Compute, "radius").unwrap().raw(), vec![0; 4]);
    assert!(a.param(ShaderStage::Pixel, "radius").is_none());
    assert!(a.param(ShaderStage::Compute, "missing").is_none());

    a.apply(&mut fx.device).unwrap();
    assert!(fx.device.calls().contains(&DeviceCall::BindUniformBuffers {
        stage: ShaderStage::Compute,
        start_slot: 3,
        buffers: vec!["Blur_CS.$Params".to_string()],
    }));
    let uploads = fx.device.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, 4.0f32.to_ne_bytes().to_vec());
}

// ============================================================================
// DISPATCH
// ============================================================================

#[test]
fn test_dispatch_rounds_up_by_group_size() {
    let mut fx = Fixture::new();
    let cs = fx.module(
        "Tile_CS",
        ShaderStage::Compute,
        ShaderReflection::new().with_thread_group_size([16, 16, 1]),
    );
    let pass = fx.pass("Tile", &[cs]);
    assert_eq!(pass.thread_group_size(), Some([16, 16, 1]));

    pass.dispatch(&mut fx.device, 1920, 1080, 1).unwrap();
    assert_eq!(fx.device.calls().last(), Some(&DeviceCall::Dispatch(120, 68, 1)));
}

#[test]
fn test_dispatch_without_compute_is_invalid() {
    let mut fx = Fixture::new();
    let ps = fx.module("Only_PS", ShaderStage::Pixel, ShaderReflection::new());
    let pass = fx.pass("Only", &[ps]);
    let err = pass.dispatch(&mut fx.device, 1, 1, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert_eq!(fx.device.count(|c| matches!(c, DeviceCall::Dispatch(..))), 0);
}
