/// Raw SPIR-V word handling
///
/// Only what spirq does not expose directly: magic-number detection,
/// byte/word conversion and the compute `LocalSize` execution mode.

use effect_helper::effect::{Error, Result};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Header length in words (magic, version, generator, bound, schema)
const HEADER_WORDS: usize = 5;

const OP_EXECUTION_MODE: u32 = 16;
const EXECUTION_MODE_LOCAL_SIZE: u32 = 17;

/// Whether `bytes` start with the SPIR-V magic number, in either byte order
pub fn is_spirv(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return false;
    }
    let first = [bytes[0], bytes[1], bytes[2], bytes[3]];
    u32::from_le_bytes(first) == SPIRV_MAGIC || u32::from_be_bytes(first) == SPIRV_MAGIC
}

/// Decode a SPIR-V byte stream into host words
///
/// The byte order is taken from the magic number.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if !is_spirv(bytes) {
        return Err(Error::ReflectionFailed(format!(
            "{} bytes are not a SPIR-V module",
            bytes.len()
        )));
    }
    let little = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == SPIRV_MAGIC;
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| {
            let word = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if little {
                u32::from_le_bytes(word)
            } else {
                u32::from_be_bytes(word)
            }
        })
        .collect())
}

/// Little-endian byte stream of a word vector (the on-disk format)
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Thread-group size declared by `OpExecutionMode ... LocalSize x y z`
///
/// Sizes declared through specialization constants (`LocalSizeId`) are not
/// resolved.
pub fn local_size(words: &[u32]) -> Option<[u32; 3]> {
    let mut cursor = HEADER_WORDS;
    while cursor < words.len() {
        let word = words[cursor];
        let count = (word >> 16) as usize;
        let opcode = word & 0xffff;
        if count == 0 || cursor + count > words.len() {
            return None;
        }
        if opcode == OP_EXECUTION_MODE && count == 6 && words[cursor + 2] == EXECUTION_MODE_LOCAL_SIZE {
            return Some([words[cursor + 3], words[cursor + 4], words[cursor + 5]]);
        }
        cursor += count;
    }
    None
}

#[cfg(test)]
#[path = "spirv_tests.rs"]
mod tests;
