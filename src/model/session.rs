use crate::model::{DatabaseSubtype, EntryKey, VectorStoreMode};
use std::collections::HashMap;

/// Editor-only state that accompanies the document but is never serialized with it
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    database_subtypes: HashMap<String, DatabaseSubtype>,
    vector_store_modes: HashMap<String, VectorStoreMode>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_subtype(&self, key: &str) -> Option<DatabaseSubtype> {
        self.database_subtypes.get(key).copied()
    }

    pub fn remember_database_subtype(&mut self, key: &str, subtype: DatabaseSubtype) {
        self.database_subtypes.insert(key.to_string(), subtype);
    }

    pub fn vector_store_mode(&self, key: &str) -> Option<VectorStoreMode> {
        self.vector_store_modes.get(key).copied()
    }

    pub fn remember_vector_store_mode(&mut self, key: &str, mode: VectorStoreMode) {
        self.vector_store_modes.insert(key.to_string(), mode);
    }

    /// Drop any hint held for an entry that no longer exists
    pub fn forget(&mut self, entry: &EntryKey) {
        match entry.namespace {
            crate::model::Namespace::Databases => {
                self.database_subtypes.remove(&entry.key);
            }
            crate::model::Namespace::VectorStores => {
                self.vector_store_modes.remove(&entry.key);
            }
            _ => {}
        }
    }

    /// Carry hints over when an entry is renamed
    pub fn rename(&mut self, from: &EntryKey, to: &str) {
        match from.namespace {
            crate::model::Namespace::Databases => {
                if let Some(subtype) = self.database_subtypes.remove(&from.key) {
                    self.database_subtypes.insert(to.to_string(), subtype);
                }
            }
            crate::model::Namespace::VectorStores => {
                if let Some(mode) = self.vector_store_modes.remove(&from.key) {
                    self.vector_store_modes.insert(to.to_string(), mode);
                }
            }
            _ => {}
        }
    }
}
