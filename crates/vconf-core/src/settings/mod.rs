//! Registry settings loaded from `vconf.toml`.
//!
//! The file names the storage roots, naming policy and the kind
//! registration table:
//!
//! ```toml
//! roots = ["Configs"]
//! prefix = "SF"
//!
//! [buckets]
//! node = "Node Configs"
//! global = "Global Configs"
//!
//! [[kind]]
//! name = "SFPlayerStatsConfig"
//! capability = "node"
//! dir = "PlayerStats"
//!
//! [kind.defaults]
//! health = 100
//! ```

pub mod parser;
pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::{
    BucketPolicy, CategoryNamer, DEFAULT_GLOBAL_BUCKET, DEFAULT_NODE_BUCKET, DEFAULT_PREFIX,
};
use crate::kind::{KindCapability, KindDefinition, KindRegistry};
use crate::locator::{DEFAULT_EXTENSION, InstanceLocator};
use crate::workspace::Workspace;

pub use parser::{parse_settings, parse_settings_str, to_toml};
pub use paths::{SETTINGS_FILE_NAME, resolve_settings_path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage roots; relative entries resolve against the project root.
    pub roots: Vec<PathBuf>,
    /// Extension of stored config files, without the dot.
    pub extension: String,
    /// Project prefix stripped from kind names.
    pub prefix: String,
    pub buckets: BucketSettings,
    /// Keep tree nodes for kinds with no stored instance.
    pub show_empty_kinds: bool,
    #[serde(rename = "kind", skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<KindSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("Configs")],
            extension: DEFAULT_EXTENSION.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            buckets: BucketSettings::default(),
            show_empty_kinds: false,
            kinds: Vec::new(),
        }
    }
}

/// Bucket labels. `flat` wins over the per-capability labels when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat: Option<String>,
}

impl BucketSettings {
    pub fn policy(&self) -> BucketPolicy {
        if let Some(flat) = &self.flat {
            return BucketPolicy::Flat(flat.clone());
        }
        BucketPolicy::ByCapability {
            node: self
                .node
                .clone()
                .unwrap_or_else(|| DEFAULT_NODE_BUCKET.to_string()),
            global: self
                .global
                .clone()
                .unwrap_or_else(|| DEFAULT_GLOBAL_BUCKET.to_string()),
        }
    }
}

/// One entry of the kind registration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSettings {
    pub name: String,
    pub capability: KindCapability,
    /// Conventional directory under the first storage root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Fields of a freshly created instance.
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub defaults: toml::Table,
}

impl KindSettings {
    pub fn definition(&self) -> anyhow::Result<KindDefinition> {
        let mut definition = KindDefinition::new(&self.name, self.capability);
        if let Some(dir) = &self.dir {
            definition = definition.with_storage_dir(dir);
        }

        let defaults = serde_json::to_value(&self.defaults)
            .with_context(|| format!("Invalid defaults for kind '{}'", self.name))?;
        match defaults {
            Value::Object(fields) => Ok(definition.with_defaults(fields)),
            _ => anyhow::bail!("Defaults for kind '{}' must be a table", self.name),
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        parse_settings(path)
    }

    /// Build the kind catalog from the registration table.
    pub fn registry(&self) -> anyhow::Result<KindRegistry> {
        let mut registry = KindRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }

    /// Add the registration table to a catalog that may already hold
    /// kinds registered in code.
    pub fn register_into(&self, registry: &mut KindRegistry) -> anyhow::Result<()> {
        for kind in &self.kinds {
            registry
                .register(kind.definition()?)
                .with_context(|| format!("Failed to register kind '{}'", kind.name))?;
        }
        Ok(())
    }

    pub fn locator(&self, project_root: &Path) -> InstanceLocator {
        let roots = self
            .roots
            .iter()
            .map(|root| {
                if root.is_absolute() {
                    root.clone()
                } else {
                    project_root.join(root)
                }
            })
            .collect();
        InstanceLocator::with_extension(roots, &self.extension)
    }

    pub fn namer(&self) -> CategoryNamer {
        CategoryNamer::new(&self.prefix, self.buckets.policy())
    }

    /// Assemble a workspace from these settings.
    pub fn workspace(&self, project_root: &Path) -> anyhow::Result<Workspace> {
        self.workspace_with(project_root, KindRegistry::new())
    }

    /// Like [`Settings::workspace`], on top of kinds registered in code.
    pub fn workspace_with(
        &self,
        project_root: &Path,
        mut registry: KindRegistry,
    ) -> anyhow::Result<Workspace> {
        self.register_into(&mut registry)?;
        Ok(
            Workspace::new(registry, self.locator(project_root), self.namer())
                .with_empty_kinds(self.show_empty_kinds),
        )
    }
}
