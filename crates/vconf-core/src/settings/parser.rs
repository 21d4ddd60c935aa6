//! TOML parser for `vconf.toml` with helpful error messages

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use super::Settings;

/// Parse `vconf.toml` with detailed error messages
pub fn parse_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    parse_settings_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}

/// Parse settings content from string
pub fn parse_settings_str(content: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    validate_settings(&settings)?;

    Ok(settings)
}

/// Serialize settings back to TOML
pub fn to_toml(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")
}

/// Attach the offending line and its neighbours to a TOML error
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())].lines().count().max(1);
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let current = start + i + 1;
            let marker = if current == line_num { ">" } else { " " };
            format!("{} {:4} | {}", marker, current, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate settings after parsing
fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.roots.is_empty() {
        anyhow::bail!("At least one storage root is required");
    }

    let extension = settings.extension.trim_start_matches('.');
    if extension.is_empty() || extension.contains(['/', '\\']) {
        anyhow::bail!("Invalid config file extension: '{}'", settings.extension);
    }

    let mut names = HashSet::new();
    for kind in &settings.kinds {
        if kind.name.trim().is_empty() {
            anyhow::bail!("Kind names must not be empty");
        }
        if !names.insert(kind.name.as_str()) {
            anyhow::bail!("Kind '{}' is declared more than once", kind.name);
        }
        if let Some(dir) = &kind.dir
            && dir.is_absolute()
        {
            anyhow::bail!(
                "Storage dir of kind '{}' must be relative to the storage root",
                kind.name
            );
        }
    }

    Ok(())
}
