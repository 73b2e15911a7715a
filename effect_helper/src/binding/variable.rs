/// Named view into a uniform block
///
/// A `Variable` is a cheap handle: cloning it shares the underlying block.
/// Every setter writes into the block's CPU mirror, clamped to the variable's
/// byte width, and returns whether any byte changed. The block is only marked
/// dirty on an actual change.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::binding::UniformBlock;

/// Byte stride between matrix rows in a uniform block
const MATRIX_ROW_STRIDE: u32 = 16;

#[derive(Clone)]
pub struct Variable {
    block: Rc<RefCell<UniformBlock>>,
    name: String,
    offset: u32,
    size: u32,
}

impl Variable {
    pub fn new(block: Rc<RefCell<UniformBlock>>, name: &str, offset: u32, size: u32) -> Self {
        Self {
            block,
            name: name.to_string(),
            offset,
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset inside the owning block
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Byte width
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Slot of the owning block
    pub fn block_slot(&self) -> u32 {
        self.block.borrow().slot()
    }

    pub fn block_name(&self) -> String {
        self.block.borrow().name().to_string()
    }

    /// Whether the owning block has changes not yet uploaded
    pub fn is_dirty(&self) -> bool {
        self.block.borrow().is_dirty()
    }

    /// Whether both handles view the same block
    pub fn shares_block_with(&self, other: &Variable) -> bool {
        Rc::ptr_eq(&self.block, &other.block)
    }

    // ===== RAW ACCESS =====

    /// Copy of the current bytes
    pub fn raw(&self) -> Vec<u8> {
        self.block.borrow().read(self.offset, self.size).to_vec()
    }

    pub fn set_raw(&self, bytes: &[u8]) -> bool {
        self.write_at(0, bytes)
    }

    fn write_at(&self, relative: u32, bytes: &[u8]) -> bool {
        if relative >= self.size {
            return false;
        }
        let len = bytes.len().min((self.size - relative) as usize);
        self.block
            .borrow_mut()
            .write(self.offset + relative, &bytes[..len])
    }

    // ===== SCALARS =====

    pub fn set_uint(&self, value: u32) -> bool {
        self.set_raw(bytemuck::bytes_of(&value))
    }

    pub fn set_sint(&self, value: i32) -> bool {
        self.set_raw(bytemuck::bytes_of(&value))
    }

    pub fn set_float(&self, value: f32) -> bool {
        self.set_raw(bytemuck::bytes_of(&value))
    }

    // ===== VECTORS =====

    pub fn set_uint_vector(&self, values: &[u32]) -> bool {
        self.set_raw(bytemuck::cast_slice(values))
    }

    pub fn set_sint_vector(&self, values: &[i32]) -> bool {
        self.set_raw(bytemuck::cast_slice(values))
    }

    pub fn set_float_vector(&self, values: &[f32]) -> bool {
        self.set_raw(bytemuck::cast_slice(values))
    }

    pub fn set_vec4(&self, value: Vec4) -> bool {
        self.set_raw(bytemuck::bytes_of(&value))
    }

    // ===== MATRICES =====

    /// Write a `rows` x `cols` matrix given row by row
    ///
    /// Each row starts on a 16-byte boundary, as uniform block packing
    /// requires. Rows missing from `values` are left untouched.
    pub fn set_float_matrix(&self, rows: u32, cols: u32, values: &[f32]) -> bool {
        let cols = cols.min(4) as usize;
        if cols == 0 {
            return false;
        }
        let mut changed = false;
        for (row, chunk) in values.chunks(cols).take(rows as usize).enumerate() {
            changed |= self.write_at(row as u32 * MATRIX_ROW_STRIDE, bytemuck::cast_slice(chunk));
        }
        changed
    }

    /// Write a 4x4 matrix in glam's column-major order
    pub fn set_mat4(&self, value: &Mat4) -> bool {
        self.set_raw(bytemuck::cast_slice(&value.to_cols_array()))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
