//! Terminal host for the save and create workflows.
//!
//! Answers destination prompts with dialoguer, prints exported configs and
//! logs storage refreshes.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use dialoguer::{Input, theme::ColorfulTheme};
use tracing::debug;

use vconf_core::persistence::{
    ClipboardSink, DestinationPicker, DestinationRequest, StorageRefresher,
};

/// Values from CLI args that skip the destination prompt.
#[derive(Debug, Clone, Default)]
pub struct PrefilledDestination {
    /// Explicit destination (`--to`); used for the next prompt only
    pub to: Option<PathBuf>,
    /// Accept the suggested destination (`-y`)
    pub yes: bool,
}

pub struct TerminalHost<W: Write = io::Stdout> {
    prefilled: PrefilledDestination,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl TerminalHost<io::Stdout> {
    pub fn new(prefilled: PrefilledDestination) -> Self {
        Self {
            prefilled,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> TerminalHost<W> {
    #[cfg(test)]
    pub fn with_writer(prefilled: PrefilledDestination, writer: W) -> Self {
        Self {
            prefilled,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    fn print_request(&mut self, request: &DestinationRequest) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style(format!("  {}", request.title)).bold().cyan())?;
        writeln!(
            self.writer,
            "  Suggested: {}",
            style(request.suggested_path().display()).green()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> DestinationPicker for TerminalHost<W> {
    fn pick_destination(&mut self, request: &DestinationRequest) -> Result<Option<PathBuf>> {
        if let Some(to) = self.prefilled.to.take() {
            return Ok(Some(to));
        }
        if self.prefilled.yes {
            return Ok(Some(request.suggested_path()));
        }

        self.print_request(request)?;
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt("Destination (empty to cancel)")
            .with_initial_text(request.suggested_path().display().to_string())
            .allow_empty(true)
            .interact_text()?;

        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
    }
}

impl<W: Write> StorageRefresher for TerminalHost<W> {
    fn refresh_storage(&mut self) {
        debug!("Storage refreshed");
    }
}

impl<W: Write> ClipboardSink for TerminalHost<W> {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{text}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DestinationRequest {
        DestinationRequest {
            title: "Save Config".to_string(),
            directory: PathBuf::from("/project/Configs/Levels"),
            file_name: "level-01.json".to_string(),
            extension: "json".to_string(),
        }
    }

    #[test]
    fn test_prefilled_destination_default() {
        let prefilled = PrefilledDestination::default();

        assert!(prefilled.to.is_none());
        assert!(!prefilled.yes);
    }

    #[test]
    fn test_explicit_destination_used_once() {
        let prefilled = PrefilledDestination {
            to: Some(PathBuf::from("custom.json")),
            yes: true,
        };
        let mut output = Vec::new();
        let mut host = TerminalHost::with_writer(prefilled, &mut output);

        let first = host.pick_destination(&request()).unwrap();
        let second = host.pick_destination(&request()).unwrap();

        assert_eq!(first, Some(PathBuf::from("custom.json")));
        assert_eq!(
            second,
            Some(PathBuf::from("/project/Configs/Levels/level-01.json"))
        );
    }

    #[test]
    fn test_yes_accepts_suggestion_silently() {
        let prefilled = PrefilledDestination {
            to: None,
            yes: true,
        };
        let mut output = Vec::new();
        let mut host = TerminalHost::with_writer(prefilled, &mut output);

        let chosen = host.pick_destination(&request()).unwrap();

        assert_eq!(
            chosen,
            Some(PathBuf::from("/project/Configs/Levels/level-01.json"))
        );
        drop(host);
        assert!(output.is_empty());
    }

    #[test]
    fn test_export_prints_text() {
        let mut output = Vec::new();
        let mut host = TerminalHost::with_writer(PrefilledDestination::default(), &mut output);

        host.copy_text("{\n  \"Type\": \"SFLevelConfig\"\n}").unwrap();
        drop(host);

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "{\n  \"Type\": \"SFLevelConfig\"\n}\n"
        );
    }
}
