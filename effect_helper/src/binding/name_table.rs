/// Hashed name lookup with collision detection
///
/// Names are keyed by a 64-bit FxHash. The original string is stored next to
/// every entry: a lookup whose string does not match is a miss, and inserting
/// a different name under an existing key is reported as a collision instead
/// of silently aliasing.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

/// Hashed form of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(pub u64);

impl NameKey {
    pub fn of(name: &str) -> Self {
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        NameKey(hasher.finish())
    }
}

/// Why an insertion was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameInsertError {
    /// The same name is already present
    Occupied,
    /// A different name already owns the key
    Collision { existing: String },
}

#[derive(Debug, Clone)]
pub struct NameTable<T> {
    entries: FxHashMap<NameKey, (String, T)>,
}

impl<T> Default for NameTable<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<T> NameTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new name, refusing duplicates and collisions
    pub fn insert(&mut self, name: &str, value: T) -> Result<(), NameInsertError> {
        self.insert_with_key(NameKey::of(name), name, value)
    }

    pub(crate) fn insert_with_key(&mut self, key: NameKey, name: &str, value: T) -> Result<(), NameInsertError> {
        if let Some((existing, _)) = self.entries.get(&key) {
            return Err(if existing == name {
                NameInsertError::Occupied
            } else {
                NameInsertError::Collision {
                    existing: existing.clone(),
                }
            });
        }
        self.entries.insert(key, (name.to_string(), value));
        Ok(())
    }

    /// Check that `name` could be inserted or already maps to itself
    ///
    /// Returns the name currently owning the key when it is a different one.
    pub fn collision_for(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&NameKey::of(name))
            .filter(|(existing, _)| existing != name)
            .map(|(existing, _)| existing.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.get_by_key(NameKey::of(name), name)
    }

    pub(crate) fn get_by_key(&self, key: NameKey, name: &str) -> Option<&T> {
        self.entries
            .get(&key)
            .filter(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .get_mut(&NameKey::of(name))
            .filter(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// (name, value) pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.values().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
#[path = "name_table_tests.rs"]
mod tests;
