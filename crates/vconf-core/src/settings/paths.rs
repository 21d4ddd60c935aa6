//! Settings path resolution helpers.

use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "vconf.toml";

/// Candidate settings files, most specific first.
pub fn settings_path_candidates(project_root: &Path, global_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![project_root.join(SETTINGS_FILE_NAME)];
    if let Some(global_dir) = global_dir {
        candidates.push(global_dir.join(SETTINGS_FILE_NAME));
    }
    candidates
}

/// Pick the settings file: an explicit path wins, then the first existing
/// candidate. `None` means built-in defaults.
pub fn resolve_settings_path(explicit: Option<&Path>, project_root: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let global_dir = dirs::config_dir().map(|p| p.join("vconf"));
    settings_path_candidates(project_root, global_dir.as_deref())
        .into_iter()
        .find(|p| p.is_file())
}
