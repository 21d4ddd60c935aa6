//! Instance locator: finds stored instances under the storage roots.
//!
//! Every file with the configured extension below a root is decoded. Files
//! that fail to decode are skipped with a warning; a single bad file never
//! aborts the scan.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::instance::{ConfigInstance, Decoded, decode};
use crate::kind::{ConfigKind, KindId, KindRegistry};

/// Default extension of stored config files.
pub const DEFAULT_EXTENSION: &str = "json";

/// An instance together with the file it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedInstance {
    pub instance: ConfigInstance,
    pub path: PathBuf,
}

/// Output of one full scan, grouped by kind in file-scan order.
#[derive(Debug, Default)]
pub struct ScanResult {
    by_kind: HashMap<KindId, Vec<LocatedInstance>>,
    /// Files that could not be decoded.
    pub skipped: Vec<RegistryError>,
}

impl ScanResult {
    pub fn instances_of(&self, kind: KindId) -> &[LocatedInstance] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn take_instances_of(&mut self, kind: KindId) -> Vec<LocatedInstance> {
        self.by_kind.remove(&kind).unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone)]
pub struct InstanceLocator {
    roots: Vec<PathBuf>,
    extension: String,
}

impl InstanceLocator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_extension(roots, DEFAULT_EXTENSION)
    }

    pub fn with_extension(roots: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            roots,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The first storage root; new kinds without instances are stored here.
    pub fn primary_root(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Conventional directory for instances of `kind`.
    pub fn conventional_dir(&self, kind: &ConfigKind) -> Option<PathBuf> {
        let root = self.primary_root()?;
        Some(match kind.storage_dir() {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        })
    }

    /// Every stored instance of `kind` with the path it was read from.
    pub fn locate(&self, registry: &KindRegistry, kind: &ConfigKind) -> Vec<LocatedInstance> {
        self.scan(registry).take_instances_of(kind.id())
    }

    /// Scan all roots once and group the decoded instances by kind.
    pub fn scan(&self, registry: &KindRegistry) -> ScanResult {
        let mut result = ScanResult::default();
        let mut seen = HashSet::new();

        for path in self.candidate_files() {
            let identity = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(identity) {
                continue;
            }

            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable config file");
                    result.skipped.push(RegistryError::io(&path, e));
                    continue;
                }
            };

            match decode(&text, &path, registry) {
                Ok(Decoded::Instance(instance)) => {
                    result
                        .by_kind
                        .entry(instance.kind())
                        .or_default()
                        .push(LocatedInstance { instance, path });
                }
                Ok(Decoded::UnknownKind(name)) => {
                    debug!(path = %path.display(), kind = %name, "Ignoring config of unregistered kind");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping malformed config file");
                    result.skipped.push(e);
                }
            }
        }

        debug!(
            roots = self.roots.len(),
            instances = result.total(),
            skipped = result.skipped.len(),
            "Config scan finished"
        );
        result
    }

    fn candidate_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "Storage root does not exist");
                continue;
            }
            self.collect_files(root, &mut files);
        }
        files
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read storage directory");
                return;
            }
        };

        // Deterministic scan order
        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let Ok(ty) = entry.file_type() else {
                continue;
            };
            if ty.is_dir() {
                self.collect_files(&path, files);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            {
                files.push(path);
            }
        }
    }
}
