//! Atomic config file writes (tmp + rename).

use std::fs;
use std::path::Path;

use crate::error::{RegistryError, Result};

/// Write `contents` to `path`, creating parent directories as needed.
///
/// The text lands in a temporary sibling first and is renamed over the
/// target, so readers never observe a half-written config.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| RegistryError::path_resolution(path, "destination has no parent directory"))?;
    fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| RegistryError::path_resolution(path, "destination has no file name"))?;
    let tmp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    fs::write(&tmp_path, contents).map_err(|e| RegistryError::io(&tmp_path, e))?;

    // Remove target first for replace semantics on Windows
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        let _ = fs::remove_file(&tmp_path);
        return Err(RegistryError::io(path, e));
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(RegistryError::io(path, e));
    }

    Ok(())
}
