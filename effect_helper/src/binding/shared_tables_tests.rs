//! Unit tests for shared_tables.rs

use std::rc::Rc;

use crate::binding::SharedTables;
use crate::device::{MockView, ReadWriteView, ResourceView, SamplerState};
use crate::shader::ResourceDimension;

#[test]
fn test_ensure_uniform_block_returns_same_block() {
    let mut tables = SharedTables::new();
    let a = tables.ensure_uniform_block("PerFrame", 0, 64);
    let b = tables.ensure_uniform_block("PerFrame", 0, 128);
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(b.borrow().size(), 64);
    assert_eq!(tables.uniform_block_count(), 1);
}

#[test]
fn test_resource_view_is_held_weakly() {
    let mut tables = SharedTables::new();
    tables.ensure_resource("gDiffuse", 3, ResourceDimension::Texture2D);

    let view: Rc<dyn ResourceView> = MockView::new("brick");
    tables.resource_mut(3).unwrap().set_view(Some(&view));
    assert_eq!(tables.resource(3).unwrap().view().unwrap().label(), "brick");
    assert_eq!(Rc::strong_count(&view), 1);

    drop(view);
    assert!(tables.resource(3).unwrap().view().is_none());
}

#[test]
fn test_ensure_keeps_first_declaration() {
    let mut tables = SharedTables::new();
    tables.ensure_resource("first", 0, ResourceDimension::Texture2D);
    tables.ensure_resource("second", 0, ResourceDimension::Texture2D);
    assert_eq!(tables.resource(0).unwrap().name, "first");
}

#[test]
fn test_known_dimension_replaces_unknown() {
    let mut tables = SharedTables::new();
    tables.ensure_resource("t", 0, ResourceDimension::Unknown);
    tables.ensure_resource("t", 0, ResourceDimension::TextureCube);
    tables.ensure_resource("t", 0, ResourceDimension::Unknown);
    assert_eq!(tables.resource(0).unwrap().dimension, ResourceDimension::TextureCube);

    tables.ensure_read_write("u", 2, ResourceDimension::Unknown);
    tables.ensure_read_write("u", 2, ResourceDimension::Buffer);
    assert_eq!(tables.read_write(2).unwrap().dimension, ResourceDimension::Buffer);
}

#[test]
fn test_sampler_set_and_clear() {
    let mut tables = SharedTables::new();
    tables.ensure_sampler("gLinear", 1);
    let sampler: Rc<dyn SamplerState> = MockView::new("linear");
    tables.sampler_mut(1).unwrap().set_sampler(Some(&sampler));
    assert!(tables.sampler(1).unwrap().sampler().is_some());
    tables.sampler_mut(1).unwrap().set_sampler(None);
    assert!(tables.sampler(1).unwrap().sampler().is_none());
}

#[test]
fn test_initial_count_is_consumed_once_per_rebind() {
    let mut tables = SharedTables::new();
    tables.ensure_read_write("gParticles", 0, ResourceDimension::Buffer);
    let view: Rc<dyn ReadWriteView> = MockView::new("particles");

    let slot = tables.read_write_mut(0).unwrap();
    slot.set_view(Some(&view), Some(0));
    assert_eq!(slot.take_initial_count(), Some(0));
    assert_eq!(slot.take_initial_count(), None);

    slot.set_view(Some(&view), Some(16));
    assert_eq!(slot.take_initial_count(), Some(16));
    assert_eq!(slot.initial_count(), Some(16));

    slot.set_view(Some(&view), None);
    assert_eq!(slot.take_initial_count(), None);
}

#[test]
fn test_clear_drops_everything() {
    let mut tables = SharedTables::new();
    tables.ensure_uniform_block("B", 0, 16);
    tables.ensure_resource("r", 0, ResourceDimension::Buffer);
    tables.ensure_sampler("s", 0);
    tables.ensure_read_write("rw", 0, ResourceDimension::Buffer);
    tables.clear();
    assert!(tables.uniform_block(0).is_none());
    assert!(tables.resource(0).is_none());
    assert!(tables.sampler(0).is_none());
    assert!(tables.read_write(0).is_none());
}
