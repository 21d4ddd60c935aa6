//! Category naming: derives display paths from kind names.
//!
//! `SFPlayerStatsConfig` with `Id = "hero-01"` becomes
//! `Node Configs/Player Stats/hero-01`; `SFAudioGlobalConfig` becomes
//! `Global Configs/Audio`. Paths are presentation only and never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::instance::ConfigInstance;
use crate::kind::{ConfigKind, KindCapability};

/// Project prefix stripped from type names unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "SF";

pub const DEFAULT_NODE_BUCKET: &str = "Node Configs";
pub const DEFAULT_GLOBAL_BUCKET: &str = "Global Configs";

/// Stripped type-name suffixes, longest first. Each is removed at most once.
const STRIPPED_SUFFIXES: [&str; 3] = ["GlobalConfig", "Repository", "Config"];

/// How the top-level bucket of a category path is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketPolicy {
    /// Separate buckets for node and global kinds.
    ByCapability { node: String, global: String },
    /// One bucket for every kind (e.g. `Configs` or `Repositories`).
    Flat(String),
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self::ByCapability {
            node: DEFAULT_NODE_BUCKET.to_string(),
            global: DEFAULT_GLOBAL_BUCKET.to_string(),
        }
    }
}

impl BucketPolicy {
    pub fn bucket_for(&self, capability: KindCapability) -> &str {
        match (self, capability) {
            (Self::ByCapability { node, .. }, KindCapability::Node) => node,
            (Self::ByCapability { global, .. }, KindCapability::Global) => global,
            (Self::Flat(bucket), _) => bucket,
        }
    }
}

/// Ordered display path of a tree entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a `/`-separated path, ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone)]
pub struct CategoryNamer {
    prefix: String,
    buckets: BucketPolicy,
}

impl Default for CategoryNamer {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, BucketPolicy::default())
    }
}

impl CategoryNamer {
    pub fn new(prefix: impl Into<String>, buckets: BucketPolicy) -> Self {
        Self {
            prefix: prefix.into(),
            buckets,
        }
    }

    pub fn buckets(&self) -> &BucketPolicy {
        &self.buckets
    }

    /// Human-readable name of a kind: prefix and suffix stripped,
    /// whitespace collapsed, words split.
    pub fn display_name(&self, type_name: &str) -> String {
        let stripped = strip_type_name(type_name, &self.prefix);
        split_words(&collapse_whitespace(stripped))
    }

    /// Category of a kind without any instance segment.
    pub fn kind_path(&self, kind: &ConfigKind) -> CategoryPath {
        CategoryPath(vec![
            self.buckets.bucket_for(kind.capability()).to_string(),
            self.display_name(kind.name()),
        ])
    }

    /// Full category of an instance. Node kinds end with the instance `Id`;
    /// global kinds end at the kind segment.
    pub fn category_for(&self, kind: &ConfigKind, instance: Option<&ConfigInstance>) -> CategoryPath {
        let mut path = self.kind_path(kind);
        if kind.is_node()
            && let Some(id) = instance.and_then(ConfigInstance::id)
        {
            path.push(id);
        }
        path
    }
}

/// Strip a leading `prefix`, then every known suffix that matches, trying
/// the longest first.
///
/// A step that would leave nothing is skipped.
pub fn strip_type_name<'a>(name: &'a str, prefix: &str) -> &'a str {
    let mut stripped = name;
    if !prefix.is_empty()
        && let Some(rest) = stripped.strip_prefix(prefix)
        && !rest.is_empty()
    {
        stripped = rest;
    }

    for suffix in STRIPPED_SUFFIXES {
        if let Some(rest) = stripped.strip_suffix(suffix)
            && !rest.trim().is_empty()
        {
            stripped = rest;
        }
    }

    stripped
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split PascalCase/camelCase into space-separated words.
///
/// A space goes before every uppercase letter that follows a lowercase letter
/// or precedes one, so acronym runs stay together: `HTTPServer` becomes
/// `HTTP Server`. Already split input is returned unchanged.
pub fn split_words(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if !prev.is_whitespace() && (prev.is_lowercase() || next_is_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{KindDefinition, KindRegistry};

    #[test]
    fn test_display_names() {
        let namer = CategoryNamer::default();

        assert_eq!(namer.display_name("SFPlayerStatsConfig"), "Player Stats");
        assert_eq!(namer.display_name("SFAudioGlobalConfig"), "Audio");
        assert_eq!(namer.display_name("SFLevelConfig"), "Level");
        assert_eq!(namer.display_name("SFInventoryRepository"), "Inventory");
        assert_eq!(namer.display_name("SFHTTPServerConfig"), "HTTP Server");
        assert_eq!(namer.display_name("PlainName"), "Plain Name");
    }

    #[test]
    fn test_overlapping_suffixes_do_not_double_strip() {
        assert_eq!(strip_type_name("SFAudioGlobalConfig", "SF"), "Audio");
        assert_eq!(strip_type_name("SFItemConfigRepository", "SF"), "Item");
        assert_eq!(strip_type_name("SFConfigConfig", "SF"), "Config");
        assert_eq!(strip_type_name("SFGlobalConfig", "SF"), "Global");
    }

    #[test]
    fn test_strip_never_empties_name() {
        assert_eq!(strip_type_name("Config", "SF"), "Config");
        assert_eq!(strip_type_name("SF", "SF"), "SF");
        assert_eq!(strip_type_name("SFConfig", "SF"), "Config");
    }

    #[test]
    fn test_prefix_only_stripped_at_start() {
        assert_eq!(strip_type_name("MySFThingConfig", "SF"), "MySFThing");
        assert_eq!(strip_type_name("SFPlayerConfig", ""), "SFPlayer");
    }

    #[test]
    fn test_split_words_is_idempotent() {
        for input in [
            "PlayerStats",
            "HTTPServer",
            "XMLHttpRequest",
            "Level2Boss",
            "already split words",
            "camelCaseName",
            "ABc",
            "",
        ] {
            let once = split_words(input);
            assert_eq!(split_words(&once), once, "{input}");
        }
    }

    #[test]
    fn test_split_words_keeps_acronyms_together() {
        assert_eq!(split_words("XMLHttpRequest"), "XML Http Request");
        assert_eq!(split_words("camelCaseName"), "camel Case Name");
        assert_eq!(split_words("UI"), "UI");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let namer = CategoryNamer::default();
        assert_eq!(namer.display_name("SFPlayer   Stats\tConfig"), "Player Stats");
    }

    #[test]
    fn test_category_paths_by_capability() {
        let mut registry = KindRegistry::new();
        let node = registry
            .register(KindDefinition::node("SFPlayerStatsConfig"))
            .unwrap();
        let global = registry
            .register(KindDefinition::global("SFAudioGlobalConfig"))
            .unwrap();
        let namer = CategoryNamer::default();

        let node_kind = registry.get(node).unwrap();
        let hero = ConfigInstance::new(node_kind, Some("hero-01".into()), 0, Default::default());
        assert_eq!(
            namer.category_for(node_kind, Some(&hero)).to_string(),
            "Node Configs/Player Stats/hero-01"
        );

        let global_kind = registry.get(global).unwrap();
        let audio = ConfigInstance::new(global_kind, None, 0, Default::default());
        assert_eq!(
            namer.category_for(global_kind, Some(&audio)).to_string(),
            "Global Configs/Audio"
        );
    }

    #[test]
    fn test_flat_bucket_policy() {
        let mut registry = KindRegistry::new();
        let id = registry
            .register(KindDefinition::node("SFInventoryRepository"))
            .unwrap();
        let kind = registry.get(id).unwrap();
        let namer = CategoryNamer::new("SF", BucketPolicy::Flat("Repositories".into()));
        let chest = ConfigInstance::new(kind, Some("chest".into()), 0, Default::default());

        assert_eq!(
            namer.category_for(kind, Some(&chest)).to_string(),
            "Repositories/Inventory/chest"
        );
    }

    #[test]
    fn test_category_path_parse() {
        let path = CategoryPath::parse(" Node Configs / Player Stats/hero-01/");
        assert_eq!(
            path.segments(),
            &["Node Configs", "Player Stats", "hero-01"]
        );
        assert_eq!(path.last(), Some("hero-01"));
    }
}
