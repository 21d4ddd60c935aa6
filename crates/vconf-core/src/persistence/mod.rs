//! Save/create workflow support: collaborator seams, clock and versioning.
//!
//! The workflow itself runs in [`crate::workspace::Workspace`]; this module
//! holds the pieces it is assembled from:
//! - [`DestinationPicker`]: "pick a save location" prompt owned by the host
//! - [`StorageRefresher`]: host index refresh, fired after every write
//! - [`ClipboardSink`]: target of the read-only Export action
//! - [`Clock`]: source of version timestamps

pub mod paths;
pub mod writer;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::hierarchy::InstanceHandle;

/// States of a single save or create run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    #[default]
    Idle,
    ConfirmingDestination,
    Writing,
    Done,
    Cancelled,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::ConfirmingDestination => "confirming-destination",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Arguments of a destination prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRequest {
    pub title: String,
    pub directory: PathBuf,
    pub file_name: String,
    /// Extension without the leading dot.
    pub extension: String,
}

impl DestinationRequest {
    pub fn suggested_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Resolves where a config is written.
pub trait DestinationPicker {
    /// Return the chosen path, or `None` (or an empty path) to cancel.
    fn pick_destination(&mut self, request: &DestinationRequest) -> anyhow::Result<Option<PathBuf>>;
}

/// Host hook notified after every successful write.
pub trait StorageRefresher {
    fn refresh_storage(&mut self);
}

/// Receives exported config text.
pub trait ClipboardSink {
    fn copy_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Source of Unix-second timestamps for versions.
pub trait Clock {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Version for a save happening at `now` over a stored `previous` version.
///
/// Normally `now`; bumped past `previous` when the clock has not advanced
/// so successive saves never repeat a version.
pub fn next_version(previous: i64, now: i64) -> i64 {
    if now > previous { now } else { previous + 1 }
}

/// Render a version as a UTC timestamp.
pub fn format_version(version: i64) -> String {
    match chrono::DateTime::from_timestamp(version, 0) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => version.to_string(),
    }
}

/// Result of a save or create run that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// `Done` or `Cancelled`.
    pub state: WorkflowState,
    /// File written, if any.
    pub destination: Option<PathBuf>,
    /// Version stamped on the written instance.
    pub version: Option<i64>,
    /// Selection after the closing reload.
    pub selected: Option<InstanceHandle>,
}

impl SaveOutcome {
    pub fn is_written(&self) -> bool {
        self.state == WorkflowState::Done
    }
}
