//! Stored configuration instances and their on-disk codec.
//!
//! One file holds one instance as indented JSON:
//!
//! ```json
//! {
//!   "Type": "SFPlayerStatsConfig",
//!   "Id": "hero-01",
//!   "Version": 1717171717,
//!   "health": 100
//! }
//! ```
//!
//! `Type` names the kind and `Version` is Unix seconds. `Id` is present only
//! for node kinds. Every other key is a kind-specific field kept verbatim.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::kind::{ConfigKind, Fields, KindCapability, KindId, KindRegistry};

/// Header keys owned by the codec. Never stored among the kind fields.
pub const RESERVED_FIELDS: [&str; 3] = ["Type", "Id", "Version"];

/// One configuration value of a registered kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigInstance {
    kind: KindId,
    capability: KindCapability,
    id: Option<String>,
    version: i64,
    fields: Fields,
}

impl ConfigInstance {
    /// Build an instance of `kind` from its fields. Node kinds get `id`,
    /// global kinds ignore it. Header keys in `fields` are dropped.
    pub fn new(kind: &ConfigKind, id: Option<String>, version: i64, mut fields: Fields) -> Self {
        strip_reserved(&mut fields);
        Self {
            kind: kind.id(),
            capability: kind.capability(),
            id: if kind.is_node() { id } else { None },
            version,
            fields,
        }
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Rename a node instance. Global instances have no `Id`.
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<()> {
        if !self.capability.is_node() {
            return Err(RegistryError::GlobalKindId);
        }
        self.id = Some(id.into());
        Ok(())
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Serialize to the canonical indented text form.
    ///
    /// Header keys inserted through [`ConfigInstance::fields_mut`] are
    /// ignored; the header always comes from the instance itself.
    pub fn encode(&self, kind: &ConfigKind) -> Result<String> {
        debug_assert_eq!(kind.id(), self.kind, "encoding with a foreign kind");
        let mut fields = self.fields.clone();
        strip_reserved(&mut fields);
        let stored = StoredConfig {
            kind: kind.name().to_string(),
            id: self.id.clone().filter(|_| kind.is_node()),
            version: self.version,
            fields,
        };
        serde_json::to_string_pretty(&stored).map_err(|source| RegistryError::Serialize {
            kind: kind.name().to_string(),
            source,
        })
    }
}

fn strip_reserved(fields: &mut Fields) {
    fields.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));
}

/// On-disk shape of a stored instance.
#[derive(Debug, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "Version", default)]
    version: i64,
    #[serde(flatten)]
    fields: Fields,
}

/// Result of decoding a single stored file.
#[derive(Debug)]
pub enum Decoded {
    /// The file holds an instance of a registered kind.
    Instance(ConfigInstance),
    /// The file is well-formed but names a kind this process does not know.
    UnknownKind(String),
}

/// Decode stored text. `path` is used for diagnostics only.
pub fn decode(text: &str, path: &Path, registry: &KindRegistry) -> Result<Decoded> {
    let parse_error = |reason: String| RegistryError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let stored: StoredConfig = serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;

    let Some(kind) = registry.by_name(&stored.kind) else {
        return Ok(Decoded::UnknownKind(stored.kind));
    };

    let id = match (kind.is_node(), stored.id) {
        (true, Some(id)) => Some(id),
        (true, None) => {
            return Err(parse_error(format!(
                "node config of kind '{}' has no Id",
                kind.name()
            )));
        }
        // Global kinds are keyed by kind alone
        (false, _) => None,
    };

    Ok(Decoded::Instance(ConfigInstance {
        kind: kind.id(),
        capability: kind.capability(),
        id,
        version: stored.version,
        fields: stored.fields,
    }))
}
