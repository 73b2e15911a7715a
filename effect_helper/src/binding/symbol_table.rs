/// Name-indexed descriptors of everything modules declared
///
/// Variables resolve to a byte range inside the uniform block at a slot;
/// resources, samplers and read-write resources resolve to their slot. All
/// names are hashed through [`NameTable`], so collisions are detected.

use crate::binding::{NameInsertError, NameTable};
use crate::effect::{Error, Result};

/// Where a uniform-block member lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableEntry {
    /// Slot of the owning uniform block
    pub slot: u32,
    pub offset: u32,
    pub size: u32,
}

/// Slot-bound binding kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Resource,
    Sampler,
    ReadWrite,
}

impl SlotKind {
    pub fn label(self) -> &'static str {
        match self {
            SlotKind::Resource => "resource",
            SlotKind::Sampler => "sampler",
            SlotKind::ReadWrite => "read-write resource",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    variables: NameTable<VariableEntry>,
    resources: NameTable<u32>,
    samplers: NameTable<u32>,
    read_write: NameTable<u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== VARIABLES =====

    pub fn variable(&self, name: &str) -> Option<&VariableEntry> {
        self.variables.get(name)
    }

    /// Check that `entry` can be registered under `name`
    ///
    /// An existing entry must live at the same slot and offset; only its
    /// width may differ.
    pub fn check_variable(&self, name: &str, entry: &VariableEntry) -> Result<()> {
        if let Some(existing) = self.variables.collision_for(name) {
            return Err(Error::NameCollision {
                existing: existing.to_string(),
                incoming: name.to_string(),
            });
        }
        match self.variables.get(name) {
            Some(current) if current.slot != entry.slot || current.offset != entry.offset => {
                Err(Error::BindingMismatch(format!(
                    "variable '{}' declared at slot {} offset {}, previously slot {} offset {}",
                    name, entry.slot, entry.offset, current.slot, current.offset
                )))
            }
            _ => Ok(()),
        }
    }

    /// Register `entry`, widening an existing entry to the larger size
    pub fn insert_variable(&mut self, name: &str, entry: VariableEntry) -> Result<()> {
        self.check_variable(name, &entry)?;
        if let Some(current) = self.variables.get_mut(name) {
            current.size = current.size.max(entry.size);
            return Ok(());
        }
        self.variables.insert(name, entry).map_err(|e| insert_error(name, e))
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    // ===== SLOTS =====

    fn slots(&self, kind: SlotKind) -> &NameTable<u32> {
        match kind {
            SlotKind::Resource => &self.resources,
            SlotKind::Sampler => &self.samplers,
            SlotKind::ReadWrite => &self.read_write,
        }
    }

    fn slots_mut(&mut self, kind: SlotKind) -> &mut NameTable<u32> {
        match kind {
            SlotKind::Resource => &mut self.resources,
            SlotKind::Sampler => &mut self.samplers,
            SlotKind::ReadWrite => &mut self.read_write,
        }
    }

    pub fn slot(&self, kind: SlotKind, name: &str) -> Option<u32> {
        self.slots(kind).get(name).copied()
    }

    /// Check that `name` can be bound to `slot`
    ///
    /// Several names may share a slot; one name may not move between slots.
    pub fn check_slot(&self, kind: SlotKind, name: &str, slot: u32) -> Result<()> {
        let table = self.slots(kind);
        if let Some(existing) = table.collision_for(name) {
            return Err(Error::NameCollision {
                existing: existing.to_string(),
                incoming: name.to_string(),
            });
        }
        match table.get(name) {
            Some(current) if *current != slot => Err(Error::BindingMismatch(format!(
                "{} '{}' declared at slot {}, previously slot {}",
                kind.label(),
                name,
                slot,
                current
            ))),
            _ => Ok(()),
        }
    }

    pub fn insert_slot(&mut self, kind: SlotKind, name: &str, slot: u32) -> Result<()> {
        self.check_slot(kind, name, slot)?;
        if self.slots(kind).contains(name) {
            return Ok(());
        }
        self.slots_mut(kind).insert(name, slot).map_err(|e| insert_error(name, e))
    }

    /// Fold the entries of `other` into this table
    pub fn merge(&mut self, other: &SymbolTable) -> Result<()> {
        for (name, entry) in other.variables.iter() {
            self.insert_variable(name, *entry)?;
        }
        for kind in [SlotKind::Resource, SlotKind::Sampler, SlotKind::ReadWrite] {
            for (name, slot) in other.slots(kind).iter() {
                self.insert_slot(kind, name, *slot)?;
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.resources.clear();
        self.samplers.clear();
        self.read_write.clear();
    }
}

fn insert_error(name: &str, err: NameInsertError) -> Error {
    match err {
        NameInsertError::Occupied => Error::BindingMismatch(format!("'{}' registered twice", name)),
        NameInsertError::Collision { existing } => Error::NameCollision {
            existing,
            incoming: name.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "symbol_table_tests.rs"]
mod tests;
