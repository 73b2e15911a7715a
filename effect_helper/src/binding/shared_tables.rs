/// Slot-indexed tables shared by every module and pass of one runtime
///
/// Two modules that agree on a slot share the entry stored here, so a value
/// set once is seen by every pass that binds the slot. Caller-supplied views
/// are held through `Weak`: the tables never keep a view alive.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::binding::UniformBlock;
use crate::device::{ReadWriteView, ResourceView, SamplerState};
use crate::shader::ResourceDimension;

/// Read-only resource slot
#[derive(Debug, Clone)]
pub struct ResourceSlot {
    /// Name of the first module declaration
    pub name: String,
    pub dimension: ResourceDimension,
    view: Option<Weak<dyn ResourceView>>,
}

impl ResourceSlot {
    pub fn new(name: &str, dimension: ResourceDimension) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            view: None,
        }
    }

    /// The bound view, if it is still alive
    pub fn view(&self) -> Option<Rc<dyn ResourceView>> {
        self.view.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_view(&mut self, view: Option<&Rc<dyn ResourceView>>) {
        self.view = view.map(Rc::downgrade);
    }
}

#[derive(Debug, Clone)]
pub struct SamplerSlot {
    pub name: String,
    sampler: Option<Weak<dyn SamplerState>>,
}

impl SamplerSlot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sampler: None,
        }
    }

    pub fn sampler(&self) -> Option<Rc<dyn SamplerState>> {
        self.sampler.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_sampler(&mut self, sampler: Option<&Rc<dyn SamplerState>>) {
        self.sampler = sampler.map(Rc::downgrade);
    }
}

/// Read-write resource slot with its hidden-counter reset
#[derive(Debug, Clone)]
pub struct ReadWriteSlot {
    pub name: String,
    pub dimension: ResourceDimension,
    view: Option<Weak<dyn ReadWriteView>>,
    initial_count: Option<u32>,
    /// Set on rebind, cleared by the first bind that passes the count
    pending: Cell<bool>,
}

impl ReadWriteSlot {
    pub fn new(name: &str, dimension: ResourceDimension) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            view: None,
            initial_count: None,
            pending: Cell::new(false),
        }
    }

    pub fn view(&self) -> Option<Rc<dyn ReadWriteView>> {
        self.view.as_ref().and_then(Weak::upgrade)
    }

    /// Rebind the slot; `initial_count` is passed on the next bind only
    pub fn set_view(&mut self, view: Option<&Rc<dyn ReadWriteView>>, initial_count: Option<u32>) {
        self.view = view.map(Rc::downgrade);
        self.initial_count = initial_count;
        self.pending.set(initial_count.is_some());
    }

    pub fn initial_count(&self) -> Option<u32> {
        self.initial_count
    }

    /// Counter value for the next bind: the configured one once, then `None`
    pub fn take_initial_count(&self) -> Option<u32> {
        if self.pending.replace(false) {
            self.initial_count
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct SharedTables {
    uniform_blocks: FxHashMap<u32, Rc<RefCell<UniformBlock>>>,
    resources: FxHashMap<u32, ResourceSlot>,
    samplers: FxHashMap<u32, SamplerSlot>,
    read_write: FxHashMap<u32, ReadWriteSlot>,
}

impl SharedTables {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== UNIFORM BLOCKS =====

    pub fn uniform_block(&self, slot: u32) -> Option<&Rc<RefCell<UniformBlock>>> {
        self.uniform_blocks.get(&slot)
    }

    /// Block at `slot`, created with `size` bytes if absent
    pub fn ensure_uniform_block(&mut self, name: &str, slot: u32, size: u32) -> Rc<RefCell<UniformBlock>> {
        self.uniform_blocks
            .entry(slot)
            .or_insert_with(|| Rc::new(RefCell::new(UniformBlock::new(name, slot, size))))
            .clone()
    }

    pub fn uniform_block_count(&self) -> usize {
        self.uniform_blocks.len()
    }

    // ===== RESOURCES =====

    pub fn resource(&self, slot: u32) -> Option<&ResourceSlot> {
        self.resources.get(&slot)
    }

    pub fn resource_mut(&mut self, slot: u32) -> Option<&mut ResourceSlot> {
        self.resources.get_mut(&slot)
    }

    /// Create the slot entry if absent
    /// Create the entry if absent; a known `dimension` replaces a stored `Unknown`
    pub fn ensure_resource(&mut self, name: &str, slot: u32, dimension: ResourceDimension) {
        let entry = self
            .resources
            .entry(slot)
            .or_insert_with(|| ResourceSlot::new(name, dimension));
        if entry.dimension == ResourceDimension::Unknown {
            entry.dimension = dimension;
        }
    }

    // ===== SAMPLERS =====

    pub fn sampler(&self, slot: u32) -> Option<&SamplerSlot> {
        self.samplers.get(&slot)
    }

    pub fn sampler_mut(&mut self, slot: u32) -> Option<&mut SamplerSlot> {
        self.samplers.get_mut(&slot)
    }

    pub fn ensure_sampler(&mut self, name: &str, slot: u32) {
        self.samplers
            .entry(slot)
            .or_insert_with(|| SamplerSlot::new(name));
    }

    // ===== READ-WRITE RESOURCES =====

    pub fn read_write(&self, slot: u32) -> Option<&ReadWriteSlot> {
        self.read_write.get(&slot)
    }

    pub fn read_write_mut(&mut self, slot: u32) -> Option<&mut ReadWriteSlot> {
        self.read_write.get_mut(&slot)
    }

    /// Create the entry if absent; a known `dimension` replaces a stored `Unknown`
    pub fn ensure_read_write(&mut self, name: &str, slot: u32, dimension: ResourceDimension) {
        let entry = self
            .read_write
            .entry(slot)
            .or_insert_with(|| ReadWriteSlot::new(name, dimension));
        if entry.dimension == ResourceDimension::Unknown {
            entry.dimension = dimension;
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.uniform_blocks.clear();
        self.resources.clear();
        self.samplers.clear();
        self.read_write.clear();
    }
}

#[cfg(test)]
#[path = "shared_tables_tests.rs"]
mod tests;
