//! Binding primitives
//!
//! Slot bitmasks and their run decomposition, hashed name tables, uniform
//! block mirrors and the tables shared by every pass of a runtime.

mod bit_runs;
mod name_table;
mod shared_tables;
mod stage_record;
mod symbol_table;
mod uniform_block;
mod variable;

pub use bit_runs::{set_bits, words_to_mask, BitRuns, SlotRun};
pub use name_table::{NameInsertError, NameKey, NameTable};
pub use shared_tables::{ReadWriteSlot, ResourceSlot, SamplerSlot, SharedTables};
pub use stage_record::{
    StageBindingRecord, MAX_READ_WRITE_SLOTS, MAX_RESOURCE_SLOTS, MAX_SAMPLER_SLOTS,
    MAX_UNIFORM_BLOCK_SLOTS,
};
pub use symbol_table::{SlotKind, SymbolTable, VariableEntry};
pub use uniform_block::UniformBlock;
pub use variable::Variable;
