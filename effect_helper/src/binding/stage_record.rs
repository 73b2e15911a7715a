/// Per-module record of the slots a stage's code references

use crate::binding::BitRuns;
use crate::shader::ShaderStage;

/// Uniform block slots per stage
pub const MAX_UNIFORM_BLOCK_SLOTS: u32 = 32;
/// Read-only resource slots per stage (four 32-bit words)
pub const MAX_RESOURCE_SLOTS: u32 = 128;
pub const MAX_SAMPLER_SLOTS: u32 = 32;
/// Read-write resource slots (pixel and compute stages)
pub const MAX_READ_WRITE_SLOTS: u32 = 64;

/// Usage bitmasks of one shader module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBindingRecord {
    pub stage: ShaderStage,
    pub uniform_blocks: u32,
    pub samplers: u32,
    /// Word `i` covers slots `32 * i .. 32 * i + 32`
    pub resources: [u32; 4],
    pub read_write: u64,
}

impl StageBindingRecord {
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            uniform_blocks: 0,
            samplers: 0,
            resources: [0; 4],
            read_write: 0,
        }
    }

    pub fn mark_uniform_block(&mut self, slot: u32) {
        debug_assert!(slot < MAX_UNIFORM_BLOCK_SLOTS);
        self.uniform_blocks |= 1 << slot;
    }

    pub fn mark_sampler(&mut self, slot: u32) {
        debug_assert!(slot < MAX_SAMPLER_SLOTS);
        self.samplers |= 1 << slot;
    }

    pub fn mark_resource(&mut self, slot: u32) {
        debug_assert!(slot < MAX_RESOURCE_SLOTS);
        self.resources[(slot / 32) as usize] |= 1 << (slot % 32);
    }

    pub fn mark_read_write(&mut self, slot: u32) {
        debug_assert!(slot < MAX_READ_WRITE_SLOTS);
        self.read_write |= 1 << slot;
    }

    pub fn uses_uniform_block(&self, slot: u32) -> bool {
        slot < MAX_UNIFORM_BLOCK_SLOTS && self.uniform_blocks & (1 << slot) != 0
    }

    pub fn uses_resource(&self, slot: u32) -> bool {
        slot < MAX_RESOURCE_SLOTS && self.resources[(slot / 32) as usize] & (1 << (slot % 32)) != 0
    }

    pub fn uses_read_write(&self, slot: u32) -> bool {
        slot < MAX_READ_WRITE_SLOTS && self.read_write & (1 << slot) != 0
    }

    pub fn uniform_block_runs(&self) -> BitRuns {
        BitRuns::new(u128::from(self.uniform_blocks))
    }

    pub fn sampler_runs(&self) -> BitRuns {
        BitRuns::new(u128::from(self.samplers))
    }

    pub fn resource_runs(&self) -> BitRuns {
        BitRuns::from_words(&self.resources)
    }

    /// Read-write slots as one mask
    pub fn read_write_mask(&self) -> u128 {
        u128::from(self.read_write)
    }

    /// Whether the module references nothing at all
    pub fn is_empty(&self) -> bool {
        self.uniform_blocks == 0 && self.samplers == 0 && self.resources == [0; 4] && self.read_write == 0
    }
}

#[cfg(test)]
#[path = "stage_record_tests.rs"]
mod tests;
