//! Unit tests for spirv.rs

use effect_helper::effect::Error;

use crate::spirv::{is_spirv, local_size, words_from_bytes, words_to_bytes, SPIRV_MAGIC};

fn instruction(opcode: u32, operands: &[u32]) -> Vec<u32> {
    let mut words = vec![((operands.len() as u32 + 1) << 16) | opcode];
    words.extend_from_slice(operands);
    words
}

fn module(body: &[Vec<u32>]) -> Vec<u32> {
    let mut words = vec![SPIRV_MAGIC, 0x0001_0000, 0, 16, 0];
    for inst in body {
        words.extend_from_slice(inst);
    }
    words
}

#[test]
fn test_magic_detection() {
    assert!(is_spirv(&SPIRV_MAGIC.to_le_bytes()));
    assert!(is_spirv(&SPIRV_MAGIC.to_be_bytes()));
    assert!(!is_spirv(b"#version 450\n"));
    assert!(!is_spirv(&[0x03, 0x02, 0x23]));
}

#[test]
fn test_big_endian_stream_decodes_to_host_words() {
    let words = [SPIRV_MAGIC, 0x0001_0300];
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    assert_eq!(words_from_bytes(&bytes).unwrap(), words.to_vec());
}

#[test]
fn test_round_trip_through_little_endian_bytes() {
    let words = module(&[]);
    assert_eq!(words_from_bytes(&words_to_bytes(&words)).unwrap(), words);
}

#[test]
fn test_non_spirv_is_reflection_failure() {
    assert!(matches!(words_from_bytes(b"text"), Err(Error::ReflectionFailed(_))));
}

#[test]
fn test_local_size_is_found_after_other_instructions() {
    // OpCapability Shader, OpExecutionMode %4 OriginUpperLeft, OpExecutionMode %4 LocalSize 8 4 1
    let words = module(&[
        instruction(17, &[1]),
        instruction(16, &[4, 7]),
        instruction(16, &[4, 17, 8, 4, 1]),
    ]);
    assert_eq!(local_size(&words), Some([8, 4, 1]));
}

#[test]
fn test_missing_local_size() {
    let words = module(&[instruction(17, &[1])]);
    assert_eq!(local_size(&words), None);
}

#[test]
fn test_truncated_instruction_stops_scan() {
    let mut words = module(&[]);
    words.push((6 << 16) | 16);
    words.push(4);
    assert_eq!(local_size(&words), None);
}
