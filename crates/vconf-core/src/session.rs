//! Session state: the latest hierarchy and the current selection.
//!
//! The instance -> path mapping is replaced wholesale on every reload and
//! never patched in place. Handles from an older build are rejected.

use std::path::Path;

use crate::category::CategoryPath;
use crate::error::{RegistryError, Result};
use crate::hierarchy::{CategoryTree, Hierarchy, HierarchyEntry, InstanceHandle};
use crate::instance::ConfigInstance;

#[derive(Debug, Default)]
pub struct SessionState {
    hierarchy: Option<Hierarchy>,
    last_generation: u64,
    selected: Option<InstanceHandle>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation number to stamp on the next build.
    pub fn next_generation(&self) -> u64 {
        self.last_generation + 1
    }

    /// Replace the current hierarchy. Any previous selection is dropped.
    pub fn install(&mut self, hierarchy: Hierarchy) {
        debug_assert!(
            hierarchy.generation() > self.last_generation,
            "hierarchy generations must increase"
        );
        self.last_generation = self.last_generation.max(hierarchy.generation());
        self.hierarchy = Some(hierarchy);
        self.selected = None;
    }

    /// Drop the mapping; callers must rebuild before further lookups.
    pub fn invalidate(&mut self) {
        self.hierarchy = None;
        self.selected = None;
    }

    pub fn is_valid(&self) -> bool {
        self.hierarchy.is_some()
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn tree(&self) -> Option<&CategoryTree> {
        self.hierarchy.as_ref().map(|h| &h.tree)
    }

    /// Whether `handle` was issued by the installed hierarchy.
    pub fn is_current(&self, handle: InstanceHandle) -> bool {
        self.entry(handle).is_some()
    }

    pub fn select(&mut self, handle: InstanceHandle) -> Result<()> {
        if !self.is_current(handle) {
            return Err(RegistryError::StaleHandle);
        }
        self.selected = Some(handle);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<InstanceHandle> {
        self.selected
    }

    pub fn instance(&self, handle: InstanceHandle) -> Option<&ConfigInstance> {
        self.entry(handle).map(|e| &e.instance)
    }

    /// Mutable access for in-place editing of a discovered instance.
    pub fn instance_mut(&mut self, handle: InstanceHandle) -> Option<&mut ConfigInstance> {
        let hierarchy = self.hierarchy.as_mut()?;
        if hierarchy.generation() != handle.generation() {
            return None;
        }
        hierarchy
            .entries
            .get_mut(handle.index())
            .map(|e| &mut e.instance)
    }

    /// File the instance was loaded from, if it belongs to the current build.
    pub fn current_path(&self, handle: InstanceHandle) -> Option<&Path> {
        self.entry(handle).map(|e| e.path.as_path())
    }

    /// `Id` the instance had when it was loaded.
    pub fn loaded_id(&self, handle: InstanceHandle) -> Option<&str> {
        self.entry(handle).and_then(|e| e.loaded_id.as_deref())
    }

    pub fn category(&self, handle: InstanceHandle) -> Option<&CategoryPath> {
        self.entry(handle).map(|e| &e.category)
    }

    /// Handle of the instance loaded from `path`.
    pub fn handle_for_path(&self, path: &Path) -> Option<InstanceHandle> {
        let hierarchy = self.hierarchy.as_ref()?;
        let index = hierarchy.entries.iter().position(|e| e.path == path)?;
        hierarchy.handle(index)
    }

    /// Handle of the first leaf at `category`.
    pub fn handle_for_category(&self, category: &CategoryPath) -> Option<InstanceHandle> {
        self.tree()?.find(category)?.instance()
    }

    fn entry(&self, handle: InstanceHandle) -> Option<&HierarchyEntry> {
        let hierarchy = self.hierarchy.as_ref()?;
        if hierarchy.generation() != handle.generation() {
            return None;
        }
        hierarchy.entries.get(handle.index())
    }
}
