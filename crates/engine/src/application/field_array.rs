//! Ordered entry lists with stable local row identity.
//!
//! Each row receives a [`RowKey`] on insertion that is unrelated to any
//! server-assigned id. Keys are never reused within one array, so a key held
//! by a caller keeps pointing at the same logical row across removals of
//! other rows.

use std::fmt;

use indexmap::IndexMap;
use sacco_types::{SectionEntry, ValidationErrors};

/// Local identity of one row inside a [`FieldArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(u64);

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct FieldArray<T> {
    rows: IndexMap<RowKey, T>,
    next_key: u64,
}

impl<T> Default for FieldArray<T> {
    fn default() -> Self {
        Self {
            rows: IndexMap::new(),
            next_key: 0,
        }
    }
}

impl<T: SectionEntry> FieldArray<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = T>) -> Self {
        let mut array = Self::new();
        array.extend(entries);
        array
    }

    /// Add `entry` at the tail.
    pub fn append(&mut self, entry: T) -> RowKey {
        let key = RowKey(self.next_key);
        self.next_key += 1;
        self.rows.insert(key, entry);
        key
    }

    /// Add a row with every field defaulted.
    pub fn append_default(&mut self) -> RowKey {
        self.append(T::default())
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = T>) {
        for entry in entries {
            self.append(entry);
        }
    }

    /// Remove the row at `index`; later rows shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.rows.shift_remove_index(index).map(|(_, entry)| entry)
    }

    /// Replace every row, e.g. with freshly fetched server entries.
    ///
    /// New rows get new keys; keys handed out before are not reused.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = T>) {
        self.rows.clear();
        self.extend(entries);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.rows.get_index(index).map(|(_, entry)| entry)
    }

    pub fn key_at(&self, index: usize) -> Option<RowKey> {
        self.rows.get_index(index).map(|(key, _)| *key)
    }

    pub fn index_of(&self, key: RowKey) -> Option<usize> {
        self.rows.get_index_of(&key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowKey, &T)> {
        self.rows.iter().map(|(key, entry)| (*key, entry))
    }

    /// Entries in display order, ready for a wire payload.
    pub fn entries(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    /// Validate every row; errors carry the row's current index.
    pub fn validate(&self, errors: &mut ValidationErrors) {
        for (index, entry) in self.rows.values().enumerate() {
            entry.validate(index, errors);
        }
    }
}
