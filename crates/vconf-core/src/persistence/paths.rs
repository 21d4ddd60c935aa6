//! Destination path helpers for save and create.

use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};

/// Characters never allowed in a suggested file stem.
const RESERVED_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn an `Id` or kind name into a file stem that stays inside its
/// directory. Returns `None` when nothing usable remains.
pub fn sanitize_file_stem(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if RESERVED_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Directory holding `known_path`. Fails when it no longer exists.
pub fn backing_dir(known_path: &Path) -> Result<PathBuf> {
    let dir = known_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| RegistryError::path_resolution(known_path, "config path has no parent directory"))?;

    if !dir.is_dir() {
        return Err(RegistryError::path_resolution(
            dir,
            "backing directory is missing",
        ));
    }
    Ok(dir.to_path_buf())
}

/// `<stem>.<ext>` in `dir`, suffixed with `-1`, `-2`, ... until unused.
pub fn unique_file_name(dir: &Path, stem: &str, extension: &str) -> String {
    let candidate = format!("{stem}.{extension}");
    if !dir.join(&candidate).exists() {
        return candidate;
    }

    (1..)
        .map(|n| format!("{stem}-{n}.{extension}"))
        .find(|name| !dir.join(name).exists())
        .unwrap_or(candidate)
}

/// Validate a chosen destination: relative paths resolve against
/// `base_dir` and a missing extension is appended.
pub fn normalize_destination(chosen: &Path, base_dir: &Path, extension: &str) -> Result<PathBuf> {
    let mut path = if chosen.is_absolute() {
        chosen.to_path_buf()
    } else {
        base_dir.join(chosen)
    };

    if path.is_dir() {
        return Err(RegistryError::path_resolution(
            path,
            "destination is a directory",
        ));
    }
    if path.file_name().is_none() {
        return Err(RegistryError::path_resolution(
            path,
            "destination has no file name",
        ));
    }
    if path.extension().is_none() {
        path.set_extension(extension);
    }
    Ok(path)
}

/// File-name stem of a destination, used as the `Id` of created configs.
pub fn id_from_destination(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RegistryError::path_resolution(path, "destination has no usable file name"))
}
