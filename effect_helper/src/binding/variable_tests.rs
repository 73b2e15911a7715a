//! Unit tests for variable.rs

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::binding::{UniformBlock, Variable};

fn block(size: u32) -> Rc<RefCell<UniformBlock>> {
    Rc::new(RefCell::new(UniformBlock::new("Test", 0, size)))
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn test_set_float_vector_writes_at_offset() {
    let b = block(32);
    let color = Variable::new(b.clone(), "color", 16, 16);
    assert!(color.set_float_vector(&[1.0, 0.0, 0.0, 1.0]));
    assert_eq!(floats(&color.raw()), vec![1.0, 0.0, 0.0, 1.0]);
    assert!(b.borrow().read(0, 16).iter().all(|x| *x == 0));
}

#[test]
fn test_same_value_twice_reports_no_change() {
    let b = block(16);
    let v = Variable::new(b.clone(), "v", 0, 4);
    assert!(v.set_float(2.5));
    assert!(!v.set_float(2.5));
    assert!(v.set_float(3.0));
}

#[test]
fn test_write_is_clamped_to_variable_width() {
    let b = block(16);
    let v = Variable::new(b.clone(), "v", 0, 8);
    v.set_uint_vector(&[1, 2, 3, 4]);
    let words: Vec<u32> = b
        .borrow()
        .data()
        .chunks(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(words, vec![1, 2, 0, 0]);
}

#[test]
fn test_scalar_setters() {
    let b = block(12);
    Variable::new(b.clone(), "u", 0, 4).set_uint(7);
    Variable::new(b.clone(), "s", 4, 4).set_sint(-3);
    Variable::new(b.clone(), "f", 8, 4).set_float(0.5);
    let data = b.borrow().data().to_vec();
    assert_eq!(u32::from_ne_bytes(data[0..4].try_into().unwrap()), 7);
    assert_eq!(i32::from_ne_bytes(data[4..8].try_into().unwrap()), -3);
    assert_eq!(f32::from_ne_bytes(data[8..12].try_into().unwrap()), 0.5);
}

#[test]
fn test_set_vec4_and_mat4() {
    let b = block(80);
    let tint = Variable::new(b.clone(), "tint", 0, 16);
    let world = Variable::new(b.clone(), "world", 16, 64);

    tint.set_vec4(Vec4::new(0.1, 0.2, 0.3, 0.4));
    assert_eq!(floats(&tint.raw()), vec![0.1, 0.2, 0.3, 0.4]);

    let m = Mat4::from_translation(glam::Vec3::new(5.0, 6.0, 7.0));
    assert!(world.set_mat4(&m));
    assert_eq!(floats(&world.raw()), m.to_cols_array().to_vec());
    assert!(!world.set_mat4(&m));
}

#[test]
fn test_float_matrix_rows_use_16_byte_stride() {
    let b = block(48);
    let m = Variable::new(b.clone(), "m3x3", 0, 44);
    assert!(m.set_float_matrix(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]));

    let values = floats(b.borrow().data());
    assert_eq!(&values[0..3], &[1.0, 2.0, 3.0]);
    assert_eq!(values[3], 0.0);
    assert_eq!(&values[4..7], &[4.0, 5.0, 6.0]);
    assert_eq!(&values[8..11], &[7.0, 8.0, 9.0]);
    assert_eq!(values[11], 0.0);
}

#[test]
fn test_variables_share_block() {
    let b = block(16);
    let a = Variable::new(b.clone(), "a", 0, 4);
    let c = Variable::new(b, "c", 4, 4);
    assert!(a.shares_block_with(&c));
    assert_eq!(a.block_slot(), 0);
    assert_eq!(a.block_name(), "Test");
}

#[test]
fn test_handle_survives_block_growth() {
    let b = block(64);
    let v = Variable::new(b.clone(), "tail", 60, 4);
    v.set_uint(11);
    b.borrow_mut().grow(80);
    assert_eq!(v.raw(), 11u32.to_ne_bytes().to_vec());
    assert!(v.set_uint(12));
}
