use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

use crate::matching::normalize_basic;

/// Original name → size in bytes.
pub type FileSizes = HashMap<String, u64>;

/// A media file as discovered on the volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File stem, without extension.
    pub name: String,
    pub full_path: PathBuf,
    pub size: u64,
    pub modified_at: NaiveDateTime,
    /// Parent folder relative to the scan root, `/`-separated, `""` at the root.
    pub subfolder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub name: String,
    pub modified_at: NaiveDateTime,
    pub subfolder: String,
    pub full_path: PathBuf,
}

impl From<&FileRecord> for InventoryEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            modified_at: record.modified_at,
            subfolder: record.subfolder.clone(),
            full_path: record.full_path.clone(),
        }
    }
}

/// Files keyed by `normalize_basic(name)`, in insertion order.
///
/// Two files whose names share a basic key collapse into one entry: the later
/// insert replaces the earlier value but keeps its position. The dropped file
/// never reaches duplicate detection, so every collision is logged.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<(String, InventoryEntry)>,
    index: HashMap<String, usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under an explicit key. Returns the replaced entry on collision.
    pub fn insert(&mut self, key: impl Into<String>, entry: InventoryEntry) -> Option<InventoryEntry> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => {
                let previous = std::mem::replace(&mut self.entries[pos].1, entry);
                warn!(
                    "Inventory key '{}' collision: '{}' replaces '{}'",
                    key,
                    self.entries[pos].1.full_path.display(),
                    previous.full_path.display()
                );
                Some(previous)
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, entry));
                None
            }
        }
    }

    /// Insert keyed by the basic-normalized name.
    pub fn add(&mut self, entry: InventoryEntry) -> Option<InventoryEntry> {
        let key = normalize_basic(&entry.name);
        self.insert(key, entry)
    }

    pub fn get(&self, key: &str) -> Option<&InventoryEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InventoryEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<InventoryEntry> for Inventory {
    fn from_iter<I: IntoIterator<Item = InventoryEntry>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for entry in iter {
            inventory.add(entry);
        }
        inventory
    }
}
