/// CPU mirror of one uniform block with dirty tracking
///
/// The mirror is the source of truth. Writes that do not change any byte
/// leave the block clean; [`UniformBlock::upload`] pushes the mirror to the
/// GPU only when something changed since the last upload.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::device::{DeviceContext, UniformBuffer};
use crate::effect::Result;

pub struct UniformBlock {
    name: String,
    slot: u32,
    data: Vec<u8>,
    dirty: bool,
    /// Members whose declared default has already been written
    seeded: FxHashSet<String>,
    /// GPU buffer, created on first upload
    buffer: Option<Rc<dyn UniformBuffer>>,
}

impl UniformBlock {
    /// Zero-filled block; starts dirty so the first apply uploads it
    pub fn new(name: &str, slot: u32, size: u32) -> Self {
        Self {
            name: name.to_string(),
            slot,
            data: vec![0; size as usize],
            dirty: true,
            seeded: FxHashSet::default(),
            buffer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn size(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// GPU buffer of the last upload
    pub fn buffer(&self) -> Option<&Rc<dyn UniformBuffer>> {
        self.buffer.as_ref()
    }

    /// Extend the block to `size` bytes, keeping existing content
    ///
    /// The GPU buffer is recreated on the next upload. Shrinking is a no-op.
    pub fn grow(&mut self, size: u32) -> bool {
        if size <= self.size() {
            return false;
        }
        self.data.resize(size as usize, 0);
        self.buffer = None;
        self.dirty = true;
        true
    }

    /// Copy `bytes` at `offset`, clamped to the block
    ///
    /// Returns whether any byte changed. Unchanged writes do not dirty the block.
    pub fn write(&mut self, offset: u32, bytes: &[u8]) -> bool {
        let start = offset as usize;
        if start >= self.data.len() || bytes.is_empty() {
            return false;
        }
        let end = (start + bytes.len()).min(self.data.len());
        let target = &mut self.data[start..end];
        let source = &bytes[..end - start];
        if target == source {
            return false;
        }
        target.copy_from_slice(source);
        self.dirty = true;
        true
    }

    /// Bytes at `offset`, clamped to the block
    pub fn read(&self, offset: u32, len: u32) -> &[u8] {
        let start = (offset as usize).min(self.data.len());
        let end = (start + len as usize).min(self.data.len());
        &self.data[start..end]
    }

    /// Write a member's declared default unless one was already seeded
    pub fn seed(&mut self, member: &str, offset: u32, bytes: &[u8]) -> bool {
        if !self.seeded.insert(member.to_string()) {
            return false;
        }
        self.write(offset, bytes);
        true
    }

    /// Make the GPU buffer current and return it
    ///
    /// Creates the buffer on first use (or after growth) and uploads the
    /// mirror if it is dirty.
    pub fn upload(&mut self, ctx: &mut dyn DeviceContext) -> Result<Rc<dyn UniformBuffer>> {
        let buffer = match &self.buffer {
            Some(buffer) if buffer.size() == self.size() => buffer.clone(),
            _ => {
                let buffer = ctx.create_uniform_buffer(&self.name, self.size())?;
                self.buffer = Some(buffer.clone());
                self.dirty = true;
                buffer
            }
        };
        if self.dirty {
            ctx.update_uniform_buffer(buffer.as_ref(), &self.data)?;
            self.dirty = false;
        }
        Ok(buffer)
    }
}

impl fmt::Debug for UniformBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformBlock")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("size", &self.data.len())
            .field("dirty", &self.dirty)
            .field("has_buffer", &self.buffer.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "uniform_block_tests.rs"]
mod tests;
