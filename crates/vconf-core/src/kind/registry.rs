//! Kind registry: the startup-time catalog of configuration kinds.
//!
//! Built once at initialization and treated as read-only afterwards.

use std::collections::HashMap;

use crate::error::{RegistryError, Result};

use super::{ConfigKind, KindCapability, KindDefinition, KindId};

/// Catalog of every configuration kind known to the process.
#[derive(Debug, Default, Clone)]
pub struct KindRegistry {
    kinds: Vec<ConfigKind>,
    by_name: HashMap<String, KindId>,
}

impl KindRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Names are the kind identity, so a second
    /// registration under the same name is rejected.
    pub fn register(&mut self, definition: KindDefinition) -> Result<KindId> {
        if definition.name.trim().is_empty() {
            return Err(RegistryError::InvalidKindName(definition.name));
        }
        if self.by_name.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateKind(definition.name));
        }

        let id = KindId::from_index(self.kinds.len());
        self.by_name.insert(definition.name.clone(), id);
        self.kinds.push(ConfigKind::from_definition(id, definition));
        Ok(id)
    }

    /// Get a kind by identity.
    pub fn get(&self, id: KindId) -> Option<&ConfigKind> {
        self.kinds.get(id.index())
    }

    /// Get a kind by the type name recorded in stored files.
    pub fn by_name(&self, name: &str) -> Option<&ConfigKind> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// Every registered kind satisfying `capability`, or every kind when
    /// `capability` is `None`. Registration order is preserved.
    pub fn all_kinds(&self, capability: Option<KindCapability>) -> Vec<&ConfigKind> {
        self.kinds
            .iter()
            .filter(|k| capability.is_none_or(|c| k.capability() == c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
