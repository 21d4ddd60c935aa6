//! Configuration kinds and the process-wide kind catalog.
//!
//! A kind is one configuration type. It is either:
//! - Global: a singleton, one stored instance per kind
//! - Node: many stored instances, each keyed by an `Id`
//!
//! Kinds are registered once at startup into a [`KindRegistry`] together with
//! a factory producing the zero-value instance used by Create.

pub mod registry;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RegistryError, Result};

pub use registry::KindRegistry;

/// Kind-specific fields of an instance, in stored order.
pub type Fields = Map<String, Value>;

/// Factory producing the zero-value fields of a new instance.
pub type KindFactory = Arc<dyn Fn() -> anyhow::Result<Fields> + Send + Sync>;

/// Capability tag distinguishing singleton kinds from multi-instance kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KindCapability {
    /// One instance per kind, keyed by the kind alone.
    Global,
    /// Many instances per kind, each keyed by an `Id`.
    Node,
}

impl KindCapability {
    pub fn is_node(self) -> bool {
        matches!(self, KindCapability::Node)
    }
}

impl fmt::Display for KindCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindCapability::Global => f.write_str("global"),
            KindCapability::Node => f.write_str("node"),
        }
    }
}

/// Identity of a registered kind. Only meaningful for the registry that
/// issued it; the string name is used at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(u32);

impl KindId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything needed to register a kind.
#[derive(Clone)]
pub struct KindDefinition {
    pub name: String,
    pub capability: KindCapability,
    /// Conventional storage directory, relative to the primary storage root.
    pub storage_dir: Option<PathBuf>,
    pub factory: KindFactory,
}

impl KindDefinition {
    /// A kind whose zero-value instance has no fields.
    pub fn new(name: impl Into<String>, capability: KindCapability) -> Self {
        Self {
            name: name.into(),
            capability,
            storage_dir: None,
            factory: Arc::new(|| Ok(Fields::new())),
        }
    }

    pub fn node(name: impl Into<String>) -> Self {
        Self::new(name, KindCapability::Node)
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, KindCapability::Global)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Use a fixed set of default fields as the zero-value instance.
    pub fn with_defaults(mut self, defaults: Fields) -> Self {
        self.factory = Arc::new(move || Ok(defaults.clone()));
        self
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Fields> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Derive the factory from a typed config's `Default` value.
    ///
    /// The default must serialize to an object; anything else surfaces as an
    /// instantiation error when the kind is created.
    pub fn with_default_of<T>(self) -> Self
    where
        T: Serialize + Default + 'static,
    {
        self.with_factory(|| match serde_json::to_value(T::default())? {
            Value::Object(fields) => Ok(fields),
            other => anyhow::bail!("default value is not an object: {other}"),
        })
    }
}

impl fmt::Debug for KindDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDefinition")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("storage_dir", &self.storage_dir)
            .finish_non_exhaustive()
    }
}

/// A registered kind. Immutable once registered.
#[derive(Clone)]
pub struct ConfigKind {
    id: KindId,
    name: String,
    capability: KindCapability,
    storage_dir: Option<PathBuf>,
    factory: KindFactory,
}

impl ConfigKind {
    pub(crate) fn from_definition(id: KindId, definition: KindDefinition) -> Self {
        Self {
            id,
            name: definition.name,
            capability: definition.capability,
            storage_dir: definition.storage_dir,
            factory: definition.factory,
        }
    }

    pub fn id(&self) -> KindId {
        self.id
    }

    /// Type name as recorded in the `Type` field of stored files.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> KindCapability {
        self.capability
    }

    pub fn is_node(&self) -> bool {
        self.capability.is_node()
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Run the factory and return the zero-value fields.
    pub fn instantiate(&self) -> Result<Fields> {
        (self.factory)().map_err(|e| RegistryError::Instantiation {
            kind: self.name.clone(),
            reason: format!("{e:#}"),
        })
    }
}

impl fmt::Debug for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKind")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("storage_dir", &self.storage_dir)
            .finish_non_exhaustive()
    }
}
